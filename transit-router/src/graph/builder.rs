//! Graph construction.
//!
//! For every line, the analyzer walks its way and looks at the stops within
//! walking distance of each stop. Every other line serving one of those
//! stops is a transfer candidate. Per candidate line it keeps at most two
//! crossings, the first and the last one:
//!
//! - the first crossing found is recorded as is;
//! - revisiting the same source stop only swaps the boarding stop for a
//!   strictly closer one;
//! - a crossing one stop away from the first one is the same logical
//!   crossing, the shorter walk wins;
//! - anything else is a later crossing and competes for the second slot,
//!   again merging adjacent stops, otherwise preferring the crossing that
//!   boards further along the target line.
//!
//! Finally a first and second crossing that ended up one stop apart are
//! merged into one.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::domain::{Line, LineId, Stop, StopId, TransportProfile};
use crate::geometry::{Geometry, SpatialIndex, SpatialIndexer};
use crate::store::DataAccess;

use super::error::BuildError;
use super::path_graph::{PathGraph, StopRef, TransferPair, Vertex};

/// A candidate transfer from the analyzed line to a target line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Crossing {
    /// Position of the alighting stop in the source way.
    pub from_pos: usize,
    pub from_stop: StopId,
    /// Position of the boarding stop in the target way.
    pub to_pos: usize,
    pub to_stop: StopId,
    /// Walking distance between the two stops.
    pub distance: f64,
}

/// Best crossings of one source line into one target line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Transfers {
    pub first: Crossing,
    pub second: Option<Crossing>,
}

impl Transfers {
    fn new(first: Crossing) -> Self {
        Self {
            first,
            second: None,
        }
    }

    /// Fold another candidate crossing into the recorded ones.
    fn offer(&mut self, candidate: Crossing) {
        let first = &mut self.first;

        if candidate.from_stop == first.from_stop {
            if candidate.distance < first.distance {
                first.to_pos = candidate.to_pos;
                first.to_stop = candidate.to_stop;
                first.distance = candidate.distance;
            }
            return;
        }

        if candidate.from_pos.abs_diff(first.from_pos) == 1 {
            if candidate.distance < first.distance {
                *first = candidate;
            }
            return;
        }

        match &mut self.second {
            None => self.second = Some(candidate),
            Some(second) if candidate.from_pos.abs_diff(second.from_pos) == 1 => {
                if candidate.distance < second.distance {
                    *second = candidate;
                }
            }
            Some(second) => {
                if second.to_pos < candidate.to_pos {
                    *second = candidate;
                }
            }
        }
    }

    /// Merge first and second crossings that are neighbours on the way.
    fn collapse_adjacent(&mut self) {
        if let Some(second) = self.second
            && second.from_pos.abs_diff(self.first.from_pos) == 1
        {
            if second.distance <= self.first.distance {
                self.first = second;
            }
            self.second = None;
        }
    }

    fn count(&self) -> usize {
        1 + usize::from(self.second.is_some())
    }
}

/// Transfer candidates of one source line, keyed by target line.
pub(crate) type TransferMap = BTreeMap<LineId, Transfers>;

/// Builds one `PathGraph` per transport profile.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder<G, S> {
    geometry: G,
    spatial: S,
}

impl<G: Geometry, S: SpatialIndexer> GraphBuilder<G, S> {
    pub fn new(geometry: G, spatial: S) -> Self {
        Self { geometry, spatial }
    }

    /// Load a profile's lines and stops from `store` and build its graph.
    pub async fn build_graph<D: DataAccess>(
        &self,
        store: &D,
        profile: &TransportProfile,
    ) -> Result<PathGraph, BuildError> {
        let (lines, stops) = load_profile_data(store, profile).await?;
        self.build(profile, lines, stops)
    }

    /// Build the graph of one profile from its lines and stops.
    pub fn build(
        &self,
        profile: &TransportProfile,
        mut lines: Vec<Line>,
        stops: Vec<Stop>,
    ) -> Result<PathGraph, BuildError> {
        profile.validate()?;
        let started = Instant::now();
        info!(
            profile = %profile,
            lines = lines.len(),
            stops = stops.len(),
            "Building path graph"
        );

        // Vertex numbers are positions in this order, so it must be total.
        lines.sort_by_key(Line::id);
        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if !seen.insert(line.id()) {
                return Err(BuildError::DuplicateLine(line.id()));
            }
        }

        let metro_lines: Vec<Line> = lines.iter().filter(|l| l.is_metro()).cloned().collect();
        let index = self.spatial.index(&stops);

        let mut graph = PathGraph::new(lines);
        let transfers = self.connect(&mut graph, &index, profile.access_zone_radius);

        if !metro_lines.is_empty() {
            let mut metro = PathGraph::without_collapse(metro_lines);
            let metro_transfers = self.connect(&mut metro, &index, profile.access_zone_radius);
            debug!(
                profile = %profile.id,
                transfers = metro_transfers,
                "Metro subgraph: {metro}"
            );
            graph.set_metro_subgraph(metro)?;
        }

        info!(
            profile = %profile.id,
            transfers,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{graph}"
        );
        Ok(graph)
    }

    /// Analyze every vertex of `graph` and add its transfer edges.
    ///
    /// Returns the number of transfer pairs recorded.
    fn connect(&self, graph: &mut PathGraph, index: &S::Index, radius: f64) -> usize {
        let mut pending: Vec<(usize, usize, TransferPair, Option<TransferPair>)> = Vec::new();
        let mut total = 0;

        for v in 0..graph.vertex_count() {
            let sources: Vec<&Line> = match graph.vertex(v) {
                Some(Vertex::Line(line)) => vec![line],
                Some(Vertex::Metro) => graph.metro_lines().collect(),
                None => continue,
            };

            // Several lines can land on the same (v, w) pair through the
            // metro vertex; group them so each pair gets a single edge.
            let mut by_target: BTreeMap<usize, Vec<(LineId, Transfers)>> = BTreeMap::new();
            for source in sources {
                let map = self.analyze_line(graph, source, index, radius);
                trace!(
                    line = %source.id(),
                    targets = map.len(),
                    transfers = map.values().map(Transfers::count).sum::<usize>(),
                    "Analyzed line"
                );
                for (target, transfers) in map {
                    if let Some(w) = graph.line_index_of(target) {
                        by_target
                            .entry(w)
                            .or_default()
                            .push((source.id(), transfers));
                    }
                }
            }

            for (w, entries) in by_target {
                let transfers = if entries.len() == 1 {
                    entries[0].1
                } else {
                    merge_transfers(&entries)
                };
                total += transfers.count();
                let first = edge_pair(graph, v, w, &transfers.first);
                let second = transfers.second.map(|c| edge_pair(graph, v, w, &c));
                pending.push((v, w, first, second));
            }
        }

        for (v, w, first, second) in pending {
            graph.add_edge(v, w, first, second);
        }
        total
    }

    /// Find the transfer candidates of one line against every other line
    /// of `graph`.
    pub(crate) fn analyze_line(
        &self,
        graph: &PathGraph,
        line: &Line,
        index: &S::Index,
        radius: f64,
    ) -> TransferMap {
        let mut map = TransferMap::new();
        // Access zones are only reused while walking this one line.
        let mut zones: HashMap<StopId, Vec<Stop>> = HashMap::new();

        // No transfers are analyzed from a line's own origin.
        for (pos, stop) in line.way().iter().enumerate().skip(1) {
            if stop.is_mock() {
                continue;
            }
            let zone = zones
                .entry(stop.id)
                .or_insert_with(|| access_zone(index, stop, radius));

            for near in zone.iter() {
                for visit in graph.lines_through(near.id) {
                    let target = graph.visit_line(visit);
                    if target.route().id == line.route().id {
                        continue;
                    }
                    // Board at the target's first visit of the stop.
                    if target.position_of(near.id) != Some(visit.position) {
                        continue;
                    }
                    let candidate = Crossing {
                        from_pos: pos,
                        from_stop: stop.id,
                        to_pos: visit.position,
                        to_stop: near.id,
                        distance: self.geometry.stop_distance(stop, near),
                    };
                    match map.entry(target.id()) {
                        Entry::Vacant(e) => {
                            e.insert(Transfers::new(candidate));
                        }
                        Entry::Occupied(mut e) => e.get_mut().offer(candidate),
                    }
                }
            }
        }

        for transfers in map.values_mut() {
            transfers.collapse_adjacent();
        }
        map
    }

}

/// Stops within walking distance of `stop`, the stop itself included.
fn access_zone<I: SpatialIndex>(index: &I, stop: &Stop, radius: f64) -> Vec<Stop> {
    let mut zone = index.stops_within_radius(stop.coord(), Some(stop), radius);
    zone.push(stop.clone());
    zone
}

/// Load everything a build needs for one profile.
pub async fn load_profile_data<D: DataAccess>(
    store: &D,
    profile: &TransportProfile,
) -> Result<(Vec<Line>, Vec<Stop>), BuildError> {
    let lines = store.lines(profile.id).await?;
    let stops = store.stops(profile.id).await?;
    Ok((lines, stops))
}

/// Reduce the crossings of several source/target line pairs sharing one
/// vertex pair to at most two: the shortest walk, then the shortest walk
/// from a different stop that is not its neighbour on the same line.
fn merge_transfers(entries: &[(LineId, Transfers)]) -> Transfers {
    let mut candidates: Vec<(LineId, Crossing)> = entries
        .iter()
        .flat_map(|(source, t)| {
            std::iter::once(t.first)
                .chain(t.second)
                .map(move |c| (*source, c))
        })
        .collect();
    candidates.sort_by(|(_, a), (_, b)| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.from_stop.cmp(&b.from_stop))
            .then(a.to_stop.cmp(&b.to_stop))
    });

    let (first_source, first) = candidates[0];
    let second = candidates[1..]
        .iter()
        .find(|(source, c)| {
            c.from_stop != first.from_stop
                && !(*source == first_source && c.from_pos.abs_diff(first.from_pos) == 1)
        })
        .map(|(_, c)| *c);

    Transfers { first, second }
}

/// Edge representation of a crossing: way positions on ordinary vertices,
/// stop ids on the metro vertex.
fn edge_pair(graph: &PathGraph, v: usize, w: usize, crossing: &Crossing) -> TransferPair {
    let from = if graph.is_metro_vertex(v) {
        StopRef::Stop(crossing.from_stop)
    } else {
        StopRef::Position(crossing.from_pos)
    };
    let to = if graph.is_metro_vertex(w) {
        StopRef::Stop(crossing.to_stop)
    } else {
        StopRef::Position(crossing.to_pos)
    };
    TransferPair::new(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crossing(from_pos: usize, to_pos: usize, distance: f64) -> Crossing {
        Crossing {
            from_pos,
            from_stop: StopId(from_pos as u32 + 100),
            to_pos,
            to_stop: StopId(to_pos as u32 + 200),
            distance,
        }
    }

    #[test]
    fn same_source_stop_keeps_closer_target() {
        let mut t = Transfers::new(crossing(2, 5, 80.0));
        let mut closer = crossing(2, 7, 30.0);
        closer.from_stop = t.first.from_stop;
        t.offer(closer);
        assert_eq!(t.first.to_pos, 7);
        assert_eq!(t.first.distance, 30.0);

        let mut farther = crossing(2, 9, 90.0);
        farther.from_stop = t.first.from_stop;
        t.offer(farther);
        assert_eq!(t.first.to_pos, 7);
        assert!(t.second.is_none());
    }

    #[test]
    fn adjacent_candidate_replaces_first_when_shorter() {
        let mut t = Transfers::new(crossing(2, 5, 80.0));
        t.offer(crossing(3, 6, 40.0));
        assert_eq!(t.first.from_pos, 3);
        assert!(t.second.is_none());

        t.offer(crossing(4, 7, 90.0));
        assert_eq!(t.first.from_pos, 3);
        assert!(t.second.is_none());
    }

    #[test]
    fn separate_crossing_becomes_second() {
        let mut t = Transfers::new(crossing(1, 1, 50.0));
        t.offer(crossing(5, 8, 60.0));
        assert_eq!(t.second.map(|c| c.from_pos), Some(5));

        // Adjacent to the second: shorter walk wins
        t.offer(crossing(6, 7, 10.0));
        assert_eq!(t.second.map(|c| c.from_pos), Some(6));

        // Not adjacent: later boarding on the target wins
        t.offer(crossing(9, 3, 5.0));
        assert_eq!(t.second.map(|c| c.from_pos), Some(6));
        t.offer(crossing(11, 12, 70.0));
        assert_eq!(t.second.map(|c| c.from_pos), Some(11));
    }

    #[test]
    fn collapse_adjacent_keeps_shorter() {
        let mut t = Transfers {
            first: crossing(3, 3, 50.0),
            second: Some(crossing(4, 4, 20.0)),
        };
        t.collapse_adjacent();
        assert_eq!(t.first.from_pos, 4);
        assert!(t.second.is_none());

        let mut t = Transfers {
            first: crossing(3, 3, 10.0),
            second: Some(crossing(4, 4, 20.0)),
        };
        t.collapse_adjacent();
        assert_eq!(t.first.from_pos, 3);
        assert!(t.second.is_none());

        let mut t = Transfers {
            first: crossing(3, 3, 10.0),
            second: Some(crossing(5, 4, 20.0)),
        };
        t.collapse_adjacent();
        assert_eq!(t.count(), 2);
    }

    #[test]
    fn merge_prefers_shortest_then_distinct_stop() {
        let a = Transfers {
            first: crossing(1, 1, 40.0),
            second: Some(crossing(6, 2, 10.0)),
        };
        let b = Transfers::new(crossing(6, 4, 25.0));
        let merged = merge_transfers(&[(LineId(1), a), (LineId(2), b)]);

        assert_eq!(merged.first.distance, 10.0);
        // Same from stop as the first one is skipped
        assert_eq!(merged.second.map(|c| c.distance), Some(40.0));
    }
}
