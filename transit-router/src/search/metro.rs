//! Ride resolution on the collapsed metro vertex.
//!
//! A metro leg only knows its boarding and alighting stop. The concrete
//! rides come from the metro subgraph: one metro line serving both stops in
//! order, or two metro lines joined by a subgraph transfer.

use crate::domain::StopId;
use crate::graph::{PathGraph, StopRef};

use super::path::Segment;

/// Fewest-stops metro rides from `board` to `alight`.
///
/// A single line is always preferred over a change.
pub(crate) fn resolve(graph: &PathGraph, board: StopId, alight: StopId) -> Option<Vec<Segment>> {
    if board == alight {
        return None;
    }
    let metro = graph.metro_subgraph()?;
    single_line(metro, board, alight).or_else(|| with_change(metro, board, alight))
}

/// Stops travelled on the metro between two stops, if reachable.
pub(crate) fn ride_len(graph: &PathGraph, board: StopId, alight: StopId) -> Option<usize> {
    resolve(graph, board, alight).map(|segments| segments.iter().map(Segment::stops_ridden).sum())
}

fn single_line(metro: &PathGraph, board: StopId, alight: StopId) -> Option<Vec<Segment>> {
    metro
        .all_lines()
        .iter()
        .filter_map(|line| {
            let b = line.position_of(board)?;
            let a = line.position_after(alight, b)?;
            Some((a - b, line, b, a))
        })
        .min_by_key(|(len, line, _, _)| (*len, line.id()))
        .and_then(|(_, line, b, a)| Segment::ride(line, b, a).map(|s| vec![s]))
}

fn with_change(metro: &PathGraph, board: StopId, alight: StopId) -> Option<Vec<Segment>> {
    let mut best: Option<(usize, Vec<Segment>)> = None;

    for v in 0..metro.vertex_count() {
        let Some(first) = metro.line_at(v) else {
            continue;
        };
        let Some(b) = first.position_of(board) else {
            continue;
        };
        for edge in metro.adjacency(v) {
            let Some(second) = metro.line_at(edge.to) else {
                continue;
            };
            for pair in edge.pairs() {
                let (StopRef::Position(from), StopRef::Position(to)) = (pair.from, pair.to) else {
                    continue;
                };
                if from <= b {
                    continue;
                }
                let Some(a) = second.position_after(alight, to) else {
                    continue;
                };
                let len = (from - b) + (a - to);
                if best.as_ref().is_some_and(|(best_len, _)| *best_len <= len) {
                    continue;
                }
                if let (Some(s1), Some(s2)) =
                    (Segment::ride(first, b, from), Segment::ride(second, to, a))
                {
                    best = Some((len, vec![s1, s2]));
                }
            }
        }
    }

    best.map(|(_, segments)| segments)
}
