//! Breadth-first transfer search.
//!
//! The traversal walks the path graph level by level, each level adding one
//! transfer. A state is a vertex together with where the passenger boarded
//! it; an edge can be followed through any of its transfer pairs whose
//! alighting point lies after the boarding point. Every (vertex, boarding)
//! state is expanded once, at the lowest transfer count it is reached with.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, trace, warn};

use crate::domain::{Stop, TransportProfile};
use crate::graph::{PathGraph, StopRef, TransferPair};

use super::config::SearchConfig;
use super::engine::{EndpointGroups, SearchEngine};
use super::metro;
use super::path::{Decision, DecisionLeg, OptimalPath, Segment};

/// Transfer search over line vertices.
#[derive(Debug, Clone)]
pub struct BfsEngine {
    max_transfers: usize,
    max_decisions: usize,
}

/// Partial journey: finished legs plus the vertex currently ridden.
#[derive(Debug, Clone)]
struct BfsState {
    legs: Vec<DecisionLeg>,
    vertex: usize,
    board: StopRef,
}

impl BfsState {
    fn has_visited(&self, v: usize) -> bool {
        self.vertex == v || self.legs.iter().any(|l| l.vertex == v)
    }

    fn transfer(&self, to_vertex: usize, pair: &TransferPair) -> Self {
        let mut legs = self.legs.clone();
        legs.push(DecisionLeg::new(self.vertex, self.board, pair.from));
        Self {
            legs,
            vertex: to_vertex,
            board: pair.to,
        }
    }

    fn finish(&self, alight: StopRef) -> Decision {
        let mut legs = self.legs.clone();
        legs.push(DecisionLeg::new(self.vertex, self.board, alight));
        Decision::new(legs)
    }
}

impl BfsEngine {
    pub fn new(max_transfers: usize, max_decisions: usize) -> Self {
        Self {
            max_transfers,
            max_decisions,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.max_transfers, config.max_decisions)
    }

    /// Single decision leg into one journey segment list.
    fn transform_leg(&self, leg: &DecisionLeg, graph: &PathGraph) -> Option<Vec<Segment>> {
        match (leg.board, leg.alight) {
            (StopRef::Position(b), StopRef::Position(a)) => {
                let line = graph.line_at(leg.vertex)?;
                Segment::ride(line, b, a).map(|s| vec![s])
            }
            (StopRef::Stop(b), StopRef::Stop(a)) if graph.is_metro_vertex(leg.vertex) => {
                metro::resolve(graph, b, a)
            }
            _ => None,
        }
    }

    fn transform(&self, decision: &Decision, graph: &PathGraph) -> Option<OptimalPath> {
        let mut segments = Vec::with_capacity(decision.legs.len());
        for leg in &decision.legs {
            segments.extend(self.transform_leg(leg, graph)?);
        }
        Some(OptimalPath::new(segments))
    }
}

impl Default for BfsEngine {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

/// Where a passenger boards vertex `v` at `stop`, if the ride can go on.
fn board_ref(graph: &PathGraph, v: usize, stop: &Stop) -> Option<StopRef> {
    if graph.is_metro_vertex(v) {
        return Some(StopRef::Stop(stop.id));
    }
    let line = graph.line_at(v)?;
    let pos = line.position_of(stop.id)?;
    (pos + 1 < line.way().len()).then_some(StopRef::Position(pos))
}

/// Stops travelled on `v` between two points, if `alight` follows `board`.
fn ride_len(graph: &PathGraph, v: usize, board: StopRef, alight: StopRef) -> Option<usize> {
    match (board, alight) {
        (StopRef::Position(b), StopRef::Position(a)) if a > b && !graph.is_metro_vertex(v) => {
            Some(a - b)
        }
        (StopRef::Stop(b), StopRef::Stop(a)) if graph.is_metro_vertex(v) => {
            metro::ride_len(graph, b, a)
        }
        _ => None,
    }
}

/// The end stop reached soonest after `board`, as an alighting point.
fn best_alight(
    graph: &PathGraph,
    v: usize,
    board: StopRef,
    ends: &BTreeSet<Stop>,
) -> Option<(usize, StopRef)> {
    ends.iter()
        .filter_map(|end| {
            let alight = match board {
                StopRef::Position(b) => {
                    StopRef::Position(graph.line_at(v)?.position_after(end.id, b)?)
                }
                StopRef::Stop(_) => StopRef::Stop(end.id),
            };
            ride_len(graph, v, board, alight).map(|len| (len, alight))
        })
        .min_by_key(|(len, _)| *len)
}

impl SearchEngine for BfsEngine {
    fn group_endpoint_vertices(
        &self,
        stops: &[Stop],
        is_start: bool,
        profile: &TransportProfile,
        graph: &PathGraph,
    ) -> EndpointGroups {
        let mut groups = EndpointGroups::new();
        for stop in stops {
            for visit in graph.lines_through(stop.id) {
                let line = graph.visit_line(visit);
                let usable = if is_start {
                    visit.position + 1 < line.way().len()
                } else {
                    visit.position > 0
                };
                if usable {
                    groups.entry(visit.vertex).or_default().insert(stop.clone());
                }
            }
        }
        debug!(
            profile = %profile.id,
            stops = stops.len(),
            vertices = groups.len(),
            start = is_start,
            "Grouped endpoint stops"
        );
        groups
    }

    fn find_direct_paths(
        &self,
        start: &EndpointGroups,
        end: &EndpointGroups,
        graph: &PathGraph,
    ) -> Vec<OptimalPath> {
        let mut decisions = Vec::new();
        for (v, starts) in start {
            let Some(ends) = end.get(v) else {
                continue;
            };
            let best = starts
                .iter()
                .filter_map(|s| board_ref(graph, *v, s))
                .filter_map(|board| {
                    best_alight(graph, *v, board, ends).map(|(len, alight)| (len, board, alight))
                })
                .min_by_key(|(len, _, _)| *len);
            if let Some((_, board, alight)) = best {
                decisions.push(Decision::direct(DecisionLeg::new(*v, board, alight)));
            }
        }
        trace!(decisions = decisions.len(), "Direct decisions");
        self.transform_decisions(&decisions, graph)
    }

    fn find_transfer_decisions(
        &self,
        start: &EndpointGroups,
        end: &EndpointGroups,
        graph: &PathGraph,
    ) -> Vec<Decision> {
        let mut seen: HashSet<(usize, StopRef)> = HashSet::new();
        let mut frontier: Vec<BfsState> = Vec::new();
        for (v, stops) in start {
            for stop in stops {
                if let Some(board) = board_ref(graph, *v, stop)
                    && seen.insert((*v, board))
                {
                    frontier.push(BfsState {
                        legs: Vec::new(),
                        vertex: *v,
                        board,
                    });
                }
            }
        }

        let mut decisions = Vec::new();
        for transfers in 0..=self.max_transfers {
            let mut next = Vec::new();
            for state in &frontier {
                if transfers > 0
                    && let Some(ends) = end.get(&state.vertex)
                    && let Some((_, alight)) = best_alight(graph, state.vertex, state.board, ends)
                {
                    decisions.push(state.finish(alight));
                    if decisions.len() >= self.max_decisions {
                        debug!(
                            limit = self.max_decisions,
                            "Decision limit reached, stopping transfer search"
                        );
                        return decisions;
                    }
                }
                if transfers == self.max_transfers {
                    continue;
                }

                for edge in graph.adjacency(state.vertex) {
                    // Metro-to-metro changes are resolved inside a metro leg.
                    if state.has_visited(edge.to) {
                        continue;
                    }
                    for pair in edge.pairs() {
                        if ride_len(graph, state.vertex, state.board, pair.from).is_some()
                            && seen.insert((edge.to, pair.to))
                        {
                            next.push(state.transfer(edge.to, pair));
                        }
                    }
                }
            }
            trace!(
                transfers,
                expanded = frontier.len(),
                next = next.len(),
                decisions = decisions.len(),
                "BFS level done"
            );
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        decisions
    }

    fn transform_decisions(&self, decisions: &[Decision], graph: &PathGraph) -> Vec<OptimalPath> {
        let paths: Vec<OptimalPath> = decisions
            .iter()
            .filter_map(|d| {
                let path = self.transform(d, graph);
                if path.is_none() {
                    debug!(decision = ?d, "Decision could not be resolved");
                }
                path
            })
            .collect();
        let dropped = decisions.len() - paths.len();
        if dropped > 0 {
            warn!(
                dropped,
                kept = paths.len(),
                "Dropped decisions that do not resolve to journeys"
            );
        }
        paths
    }
}
