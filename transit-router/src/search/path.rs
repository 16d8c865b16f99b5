//! Raw traversal decisions and the journeys they become.

use std::fmt;

use crate::domain::{Line, LineId, Route, Stop, StopId};
use crate::graph::StopRef;

/// One ride in a decision: board and alight on a single vertex.
///
/// On an ordinary vertex both ends are way positions. On the metro vertex
/// they are stop ids, resolved against the metro subgraph later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecisionLeg {
    pub vertex: usize,
    pub board: StopRef,
    pub alight: StopRef,
}

impl DecisionLeg {
    pub fn new(vertex: usize, board: StopRef, alight: StopRef) -> Self {
        Self {
            vertex,
            board,
            alight,
        }
    }
}

/// A chain of rides found by traversal, one leg per visited vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decision {
    pub legs: Vec<DecisionLeg>,
}

impl Decision {
    pub fn new(legs: Vec<DecisionLeg>) -> Self {
        Self { legs }
    }

    /// A decision riding a single vertex.
    pub fn direct(leg: DecisionLeg) -> Self {
        Self { legs: vec![leg] }
    }
}

/// A ride on one line, from boarding stop to alighting stop inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub line: LineId,
    pub route: Route,
    pub way: Vec<Stop>,
}

impl Segment {
    /// The part of `line` between two way positions, inclusive.
    ///
    /// Returns `None` unless `board < alight` and both are on the way.
    pub fn ride(line: &Line, board: usize, alight: usize) -> Option<Self> {
        if board >= alight {
            return None;
        }
        let way = line.way().get(board..=alight)?;
        Some(Self {
            line: line.id(),
            route: line.route().clone(),
            way: way.to_vec(),
        })
    }

    /// Number of stops travelled, excluding the boarding stop.
    pub fn stops_ridden(&self) -> usize {
        self.way.len().saturating_sub(1)
    }

    pub fn first_stop(&self) -> Option<&Stop> {
        self.way.first()
    }

    pub fn last_stop(&self) -> Option<&Stop> {
        self.way.last()
    }
}

/// A complete journey: consecutive rides, walking between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimalPath {
    pub segments: Vec<Segment>,
}

/// Identity of a journey for deduplication: every ride's line with its
/// boarding and alighting stop.
pub type PathKey = Vec<(LineId, Option<StopId>, Option<StopId>)>;

impl OptimalPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Stop list of each ride, in travel order.
    pub fn way(&self) -> impl Iterator<Item = &[Stop]> {
        self.segments.iter().map(|s| s.way.as_slice())
    }

    pub fn transfers(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn stops_ridden(&self) -> usize {
        self.segments.iter().map(Segment::stops_ridden).sum()
    }

    /// Lines ridden, in order.
    pub fn lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.segments.iter().map(|s| s.line)
    }

    pub fn key(&self) -> PathKey {
        self.segments
            .iter()
            .map(|s| {
                (
                    s.line,
                    s.first_stop().map(|st| st.id),
                    s.last_stop().map(|st| st.id),
                )
            })
            .collect()
    }
}

impl fmt::Display for OptimalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{} (line {})", segment.route.name, segment.line)?;
            if let (Some(from), Some(to)) = (segment.first_stop(), segment.last_stop()) {
                write!(f, " {from} .. {to}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{bus, stop};

    #[test]
    fn ride_slices_the_way() {
        let stops: Vec<Stop> = (1..=5).map(|i| stop(i, 100.0 * i as f64, 0.0)).collect();
        let line = bus(1, &stops.iter().collect::<Vec<_>>());

        let segment = Segment::ride(&line, 1, 3).unwrap();
        assert_eq!(segment.way, stops[1..=3].to_vec());
        assert_eq!(segment.stops_ridden(), 2);

        assert!(Segment::ride(&line, 3, 3).is_none());
        assert!(Segment::ride(&line, 3, 1).is_none());
        assert!(Segment::ride(&line, 2, 9).is_none());
    }

    #[test]
    fn path_metrics() {
        let stops: Vec<Stop> = (1..=6).map(|i| stop(i, 100.0 * i as f64, 0.0)).collect();
        let a = bus(1, &stops[..4].iter().collect::<Vec<_>>());
        let b = bus(2, &stops[2..].iter().collect::<Vec<_>>());

        let path = OptimalPath::new(vec![
            Segment::ride(&a, 0, 2).unwrap(),
            Segment::ride(&b, 0, 3).unwrap(),
        ]);
        assert_eq!(path.transfers(), 1);
        assert_eq!(path.stops_ridden(), 5);
        assert_eq!(path.lines().collect::<Vec<_>>(), vec![LineId(1), LineId(2)]);
        assert_eq!(
            path.key(),
            vec![
                (LineId(1), Some(StopId(1)), Some(StopId(3))),
                (LineId(2), Some(StopId(3)), Some(StopId(6))),
            ]
        );
        assert_eq!(path.way().nth(1).map(|w| w[0].id), Some(StopId(3)));
    }
}
