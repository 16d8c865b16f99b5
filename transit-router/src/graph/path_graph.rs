//! Line-level transfer graph.
//!
//! One vertex per ordinary line, in ascending line id order. All metro lines
//! of a profile share one extra vertex placed after the ordinary ones, which
//! keeps the main graph small; metro-internal transfers live in a separate
//! metro subgraph.
//!
//! An edge `v -> w` says a rider on line `v` can change to line `w`. It
//! carries up to two transfer pairs: the first and the last crossing of the
//! two lines. Middle crossings are never recorded.
//!
//! ```text
//!  v    edges of v
//! [0]   [w=1]      [w=4]      [w=4 is metro]
//!       first:     first:     first:
//!        5 -> 8     2 -> 5     3 -> #1207   (positions, or stop ids on metro)
//!       second:    second:
//!        11 -> 2    -
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::domain::{Line, LineId, Stop, StopId};

use super::error::BuildError;

/// Where a transfer happens on one side of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopRef {
    /// Position in the way of an ordinary line.
    Position(usize),
    /// Raw stop id, used on the collapsed metro vertex.
    Stop(StopId),
}

impl fmt::Display for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopRef::Position(p) => write!(f, "{p}"),
            StopRef::Stop(id) => write!(f, "#{id}"),
        }
    }
}

/// One transfer: alight on the source side, board on the target side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferPair {
    pub from: StopRef,
    pub to: StopRef,
}

impl TransferPair {
    pub fn new(from: StopRef, to: StopRef) -> Self {
        Self { from, to }
    }
}

/// Directed edge between two line vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Target vertex.
    pub to: usize,
    /// First crossing.
    pub first: TransferPair,
    /// Last crossing, when the lines cross again further on.
    pub second: Option<TransferPair>,
}

impl Edge {
    /// The recorded transfer pairs, first crossing first.
    pub fn pairs(&self) -> impl Iterator<Item = &TransferPair> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }
}

/// What a vertex stands for.
#[derive(Debug, Clone, Copy)]
pub enum Vertex<'a> {
    Line(&'a Line),
    /// The collapsed vertex shared by all metro lines.
    Metro,
}

/// A visit of a line to a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopVisit {
    /// Vertex of the visiting line.
    pub vertex: usize,
    /// Index of the line in `PathGraph::all_lines`.
    pub line: usize,
    /// Position of the stop in the line's way.
    pub position: usize,
}

/// Transfer graph over the lines of one transport profile.
///
/// Built once, then shared read-only between queries.
#[derive(Debug, Clone)]
pub struct PathGraph {
    /// All lines, ascending id.
    lines: Vec<Line>,
    /// Vertex -> index into `lines`; `None` for the metro vertex.
    vertex_lines: Vec<Option<usize>>,
    metro_vertex: Option<usize>,
    vertex_of: HashMap<LineId, usize>,
    visits: HashMap<StopId, Vec<StopVisit>>,
    /// Distinct stops served by any line, ascending id.
    stops: Vec<Stop>,
    adj: Vec<Vec<Edge>>,
    edges: usize,
    metro: Option<Box<PathGraph>>,
}

impl PathGraph {
    /// Create an edgeless graph with metro lines collapsed to one vertex.
    ///
    /// Lines are sorted by id; vertex indices follow that order. If several
    /// lines share an id, only the first one is kept.
    pub fn new(lines: Vec<Line>) -> Self {
        Self::with_layout(lines, true)
    }

    /// Create an edgeless graph with one vertex per line, metro included.
    ///
    /// Used for the metro subgraph.
    pub fn without_collapse(lines: Vec<Line>) -> Self {
        Self::with_layout(lines, false)
    }

    fn with_layout(mut lines: Vec<Line>, collapse_metro: bool) -> Self {
        lines.sort_by_key(Line::id);
        lines.dedup_by_key(|l| l.id());

        let mut vertex_lines: Vec<Option<usize>> = Vec::with_capacity(lines.len());
        for (slot, line) in lines.iter().enumerate() {
            if !(collapse_metro && line.is_metro()) {
                vertex_lines.push(Some(slot));
            }
        }
        let has_metro = collapse_metro && lines.iter().any(Line::is_metro);
        let metro_vertex = has_metro.then_some(vertex_lines.len());
        if has_metro {
            vertex_lines.push(None);
        }

        let mut vertex_of = HashMap::with_capacity(lines.len());
        for (vertex, slot) in vertex_lines.iter().enumerate() {
            if let Some(slot) = slot {
                vertex_of.insert(lines[*slot].id(), vertex);
            }
        }
        if let Some(metro) = metro_vertex {
            for line in lines.iter().filter(|l| l.is_metro()) {
                vertex_of.insert(line.id(), metro);
            }
        }

        let mut visits: HashMap<StopId, Vec<StopVisit>> = HashMap::new();
        let mut stops: HashMap<StopId, Stop> = HashMap::new();
        for (slot, line) in lines.iter().enumerate() {
            let vertex = vertex_of[&line.id()];
            for (position, stop) in line.way().iter().enumerate() {
                visits.entry(stop.id).or_default().push(StopVisit {
                    vertex,
                    line: slot,
                    position,
                });
                stops.entry(stop.id).or_insert_with(|| stop.clone());
            }
        }
        let mut stops: Vec<Stop> = stops.into_values().collect();
        stops.sort();

        let adj = vec![Vec::new(); vertex_lines.len()];

        Self {
            lines,
            vertex_lines,
            metro_vertex,
            vertex_of,
            visits,
            stops,
            adj,
            edges: 0,
            metro: None,
        }
    }

    /// Append a directed edge `v -> w`.
    ///
    /// No deduplication is done here; callers add at most one edge per
    /// vertex pair.
    ///
    /// # Panics
    ///
    /// Panics if `v` is not a vertex of this graph.
    pub fn add_edge(&mut self, v: usize, w: usize, first: TransferPair, second: Option<TransferPair>) {
        self.adj[v].push(Edge {
            to: w,
            first,
            second,
        });
        self.edges += 1;
    }

    pub fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Outgoing edges of `v`; empty for unknown vertices.
    pub fn adjacency(&self, v: usize) -> &[Edge] {
        self.adj.get(v).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The edge `v -> w`, if any.
    pub fn edge(&self, v: usize, w: usize) -> Option<&Edge> {
        self.adjacency(v).iter().find(|e| e.to == w)
    }

    /// Vertex of a line. Metro lines map to the metro vertex.
    pub fn line_index_of(&self, line: LineId) -> Option<usize> {
        self.vertex_of.get(&line).copied()
    }

    /// The line of an ordinary vertex.
    pub fn line_at(&self, v: usize) -> Option<&Line> {
        self.vertex_lines
            .get(v)
            .copied()
            .flatten()
            .map(|slot| &self.lines[slot])
    }

    pub fn vertex(&self, v: usize) -> Option<Vertex<'_>> {
        match self.vertex_lines.get(v)? {
            Some(slot) => Some(Vertex::Line(&self.lines[*slot])),
            None => Some(Vertex::Metro),
        }
    }

    /// All lines of the profile, ascending id, metro included.
    pub fn all_lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn metro_vertex(&self) -> Option<usize> {
        self.metro_vertex
    }

    pub fn is_metro_vertex(&self, v: usize) -> bool {
        self.metro_vertex == Some(v)
    }

    /// Lines collapsed into the metro vertex.
    pub fn metro_lines(&self) -> impl Iterator<Item = &Line> {
        let collapsed = self.metro_vertex.is_some();
        self.lines.iter().filter(move |l| collapsed && l.is_metro())
    }

    /// Every visit of any line to `stop`.
    pub fn lines_through(&self, stop: StopId) -> &[StopVisit] {
        self.visits.get(&stop).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The line referenced by a `StopVisit`.
    pub fn visit_line(&self, visit: &StopVisit) -> &Line {
        &self.lines[visit.line]
    }

    /// Distinct stops served by the graph's lines, ascending id.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn metro_subgraph(&self) -> Option<&PathGraph> {
        self.metro.as_deref()
    }

    /// Attach the metro subgraph. It can only be attached once.
    pub fn set_metro_subgraph(&mut self, graph: PathGraph) -> Result<(), BuildError> {
        if self.metro.is_some() {
            return Err(BuildError::MetroSubgraphAlreadySet);
        }
        self.metro = Some(Box::new(graph));
        Ok(())
    }

    /// Number of edges whose source and target are the same vertex.
    pub fn self_loop_count(&self) -> usize {
        self.adj
            .iter()
            .enumerate()
            .map(|(v, edges)| edges.iter().filter(|e| e.to == v).count())
            .sum()
    }

    pub fn vertex_degree(&self, v: usize) -> usize {
        self.adjacency(v).len()
    }

    /// `2E / V`, truncated; 0 for an empty graph.
    pub fn avg_degree(&self) -> usize {
        if self.vertex_count() == 0 {
            return 0;
        }
        2 * self.edges / self.vertex_count()
    }

    pub fn max_degree(&self) -> usize {
        self.adj.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// `ln(E) / ln(V)`; 0 when either logarithm is not meaningful.
    pub fn density(&self) -> f64 {
        let v = self.vertex_count();
        if self.edges == 0 || v <= 1 {
            return 0.0;
        }
        (self.edges as f64).ln() / (v as f64).ln()
    }

    /// Human readable adjacency of one vertex.
    pub fn vertex_report(&self, v: usize) -> String {
        let mut out = format!("*************** {v} **************\n");
        for edge in self.adjacency(v) {
            out.push_str(&format!(
                "{:<8}{:<10}{:<10}",
                format!("[{}]:", edge.to),
                format!(" [{}]", edge.first.from),
                format!(" [{}]", edge.first.to),
            ));
            if let Some(second) = &edge.second {
                out.push_str(&format!(
                    "{:<10}{:<10}",
                    format!(" [{}]", second.from),
                    format!(" [{}]", second.to),
                ));
            }
            out.push('\n');
        }
        out.push_str(&format!("edges: {}\n", self.vertex_degree(v)));
        out
    }
}

impl fmt::Display for PathGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Path graph [ vertices={}, edges={}, density={:.4}, self loops={}, \
             average degree={}, graph degree={}, max vertex degree={} ]",
            self.vertex_count(),
            self.edges,
            self.density(),
            self.self_loop_count(),
            self.avg_degree(),
            2 * self.edges,
            self.max_degree(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Route, RouteKind};

    fn line(id: u32, route: u32, kind: RouteKind, stops: &[u32]) -> Line {
        let way = stops
            .iter()
            .map(|s| Stop::new(*s, format!("S{s}"), 0.0, 0.0))
            .collect();
        Line::new(id, Route::new(route, format!("R{route}"), kind), way).unwrap()
    }

    fn pos(a: usize, b: usize) -> TransferPair {
        TransferPair::new(StopRef::Position(a), StopRef::Position(b))
    }

    #[test]
    fn empty_graph() {
        let graph = PathGraph::new(vec![]);
        assert_eq!(graph.vertex_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.avg_degree(), 0);
        assert_eq!(graph.max_degree(), 0);
        assert_eq!(graph.density(), 0.0);
        assert!(graph.adjacency(0).is_empty());
        assert!(graph.to_string().contains("vertices=0"));
    }

    #[test]
    fn vertices_follow_line_id_order() {
        let graph = PathGraph::new(vec![
            line(30, 3, RouteKind::Bus, &[1, 2]),
            line(10, 1, RouteKind::Bus, &[2, 3]),
            line(20, 2, RouteKind::Tram, &[3, 4]),
        ]);

        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.line_index_of(LineId(10)), Some(0));
        assert_eq!(graph.line_index_of(LineId(20)), Some(1));
        assert_eq!(graph.line_index_of(LineId(30)), Some(2));
        assert_eq!(graph.line_at(2).map(Line::id), Some(LineId(30)));
        assert_eq!(graph.line_index_of(LineId(99)), None);
        assert!(graph.line_at(3).is_none());
    }

    #[test]
    fn metro_lines_collapse_to_one_vertex() {
        let graph = PathGraph::new(vec![
            line(1, 1, RouteKind::Bus, &[1, 2]),
            line(2, 9, RouteKind::Metro, &[5, 6]),
            line(3, 8, RouteKind::Metro, &[6, 7]),
            line(4, 2, RouteKind::Bus, &[2, 3]),
        ]);

        // Two ordinary vertices plus the metro vertex
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.metro_vertex(), Some(2));
        assert_eq!(graph.line_index_of(LineId(2)), Some(2));
        assert_eq!(graph.line_index_of(LineId(3)), Some(2));
        assert_eq!(graph.line_index_of(LineId(4)), Some(1));
        assert!(matches!(graph.vertex(2), Some(Vertex::Metro)));
        assert!(graph.line_at(2).is_none());
        assert_eq!(graph.metro_lines().count(), 2);
        assert_eq!(graph.all_lines().len(), 4);
    }

    #[test]
    fn without_collapse_keeps_metro_lines_apart() {
        let graph = PathGraph::without_collapse(vec![
            line(2, 9, RouteKind::Metro, &[5, 6]),
            line(3, 8, RouteKind::Metro, &[6, 7]),
        ]);
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.metro_vertex(), None);
        assert_eq!(graph.metro_lines().count(), 0);
    }

    #[test]
    fn stop_index() {
        let graph = PathGraph::new(vec![
            line(1, 1, RouteKind::Bus, &[1, 2, 3]),
            line(2, 2, RouteKind::Bus, &[4, 2]),
        ]);

        let visits = graph.lines_through(StopId(2));
        assert_eq!(visits.len(), 2);
        assert_eq!(
            visits[0],
            StopVisit {
                vertex: 0,
                line: 0,
                position: 1
            }
        );
        assert_eq!(visits[1].position, 1);
        assert_eq!(graph.visit_line(&visits[1]).id(), LineId(2));
        assert!(graph.lines_through(StopId(42)).is_empty());

        let ids: Vec<u32> = graph.stops().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn edges_and_degrees() {
        let mut graph = PathGraph::new(vec![
            line(1, 1, RouteKind::Bus, &[1, 2, 3]),
            line(2, 2, RouteKind::Bus, &[4, 2, 5]),
            line(3, 3, RouteKind::Bus, &[6, 3]),
        ]);
        graph.add_edge(0, 1, pos(1, 1), None);
        graph.add_edge(0, 2, pos(2, 1), Some(pos(1, 0)));
        graph.add_edge(1, 0, pos(1, 1), None);

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.vertex_degree(0), 2);
        assert_eq!(graph.vertex_degree(2), 0);
        assert_eq!(graph.max_degree(), 2);
        // 2 * 3 / 3
        assert_eq!(graph.avg_degree(), 2);
        assert_eq!(graph.self_loop_count(), 0);
        assert_eq!(graph.edge(0, 2).map(|e| e.pairs().count()), Some(2));
        assert!(graph.edge(2, 0).is_none());

        let density = graph.density();
        assert!((density - 3f64.ln() / 3f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn self_loops_are_counted() {
        let mut graph = PathGraph::new(vec![
            line(1, 9, RouteKind::Metro, &[1, 2]),
            line(2, 8, RouteKind::Metro, &[2, 3]),
        ]);
        let metro = graph.metro_vertex().unwrap();
        graph.add_edge(
            metro,
            metro,
            TransferPair::new(StopRef::Stop(StopId(2)), StopRef::Stop(StopId(2))),
            None,
        );
        assert_eq!(graph.self_loop_count(), 1);
    }

    #[test]
    fn density_single_vertex() {
        let mut graph = PathGraph::new(vec![line(1, 1, RouteKind::Bus, &[1, 2])]);
        graph.add_edge(0, 0, pos(0, 1), None);
        // ln(1) is zero: density is defined as 0
        assert_eq!(graph.density(), 0.0);
    }

    #[test]
    fn metro_subgraph_is_set_once() {
        let mut graph = PathGraph::new(vec![]);
        assert!(graph.metro_subgraph().is_none());
        graph.set_metro_subgraph(PathGraph::new(vec![])).unwrap();
        assert!(graph.metro_subgraph().is_some());
        let err = graph.set_metro_subgraph(PathGraph::new(vec![])).unwrap_err();
        assert!(matches!(err, BuildError::MetroSubgraphAlreadySet));
    }

    #[test]
    fn vertex_report_lists_edges() {
        let mut graph = PathGraph::new(vec![
            line(1, 1, RouteKind::Bus, &[1, 2, 3]),
            line(2, 2, RouteKind::Bus, &[4, 2, 5]),
        ]);
        graph.add_edge(0, 1, pos(1, 1), Some(pos(2, 2)));

        let report = graph.vertex_report(0);
        assert!(report.contains("[1]:"));
        assert!(report.contains("edges: 1"));
    }

    #[test]
    fn duplicate_line_ids_keep_one_vertex() {
        let graph = PathGraph::new(vec![
            line(1, 1, RouteKind::Bus, &[1, 2]),
            line(1, 1, RouteKind::Bus, &[3, 4]),
        ]);
        assert_eq!(graph.vertex_count(), 1);
    }
}
