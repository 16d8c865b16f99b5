//! Route and line types.
//!
//! A `Route` is the logical service ("bus 12"); a `Line` is one physical
//! stop sequence of that route, usually one per direction.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{DomainError, Stop, StopId};

/// Identifier of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub u32);

/// Identifier of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u32);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of transport a route runs.
///
/// Metro routes are collapsed into one shared graph vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    #[default]
    Bus,
    Tram,
    Trolleybus,
    Metro,
}

impl RouteKind {
    pub fn is_metro(self) -> bool {
        matches!(self, RouteKind::Metro)
    }
}

/// A logical transit service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub name: String,
    #[serde(default)]
    pub kind: RouteKind,
}

impl Route {
    pub fn new(id: u32, name: impl Into<String>, kind: RouteKind) -> Self {
        Self {
            id: RouteId(id),
            name: name.into(),
            kind,
        }
    }

    pub fn is_metro(&self) -> bool {
        self.kind.is_metro()
    }
}

/// One stop sequence of a route.
///
/// Lines are immutable once built. Equality, hashing and ordering use only
/// the identifier, so two lines with identical ways are still distinct.
#[derive(Debug, Clone)]
pub struct Line {
    id: LineId,
    route: Route,
    way: Vec<Stop>,
    /// First position of every stop in `way`.
    positions: HashMap<StopId, usize>,
}

impl Line {
    /// Creates a line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyWay` if `way` has no stops.
    pub fn new(id: u32, route: Route, way: Vec<Stop>) -> Result<Self, DomainError> {
        if way.is_empty() {
            return Err(DomainError::EmptyWay(LineId(id)));
        }
        let mut positions = HashMap::with_capacity(way.len());
        for (idx, stop) in way.iter().enumerate() {
            positions.entry(stop.id).or_insert(idx);
        }
        Ok(Self {
            id: LineId(id),
            route,
            way,
            positions,
        })
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn is_metro(&self) -> bool {
        self.route.is_metro()
    }

    /// The ordered stops of this line.
    pub fn way(&self) -> &[Stop] {
        &self.way
    }

    /// Position of the first visit to `stop`.
    pub fn position_of(&self, stop: StopId) -> Option<usize> {
        self.positions.get(&stop).copied()
    }

    /// Position of the first visit to `stop` strictly after `after`.
    pub fn position_after(&self, stop: StopId, after: usize) -> Option<usize> {
        self.way
            .iter()
            .enumerate()
            .skip(after + 1)
            .find(|(_, s)| s.id == stop)
            .map(|(idx, _)| idx)
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Line {}

impl Hash for Line {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Line {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Line {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} of route {} ({} stops)",
            self.id,
            self.route.name,
            self.way.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops(ids: &[u32]) -> Vec<Stop> {
        ids.iter()
            .map(|id| Stop::new(*id, format!("S{id}"), 0.0, 0.0))
            .collect()
    }

    #[test]
    fn rejects_empty_way() {
        let route = Route::new(1, "1", RouteKind::Bus);
        let err = Line::new(10, route, vec![]).unwrap_err();
        assert!(matches!(err, DomainError::EmptyWay(LineId(10))));
    }

    #[test]
    fn positions_track_first_visit() {
        let route = Route::new(1, "1", RouteKind::Bus);
        // Loop line: 1 -> 2 -> 3 -> 2 -> 4
        let line = Line::new(10, route, stops(&[1, 2, 3, 2, 4])).unwrap();

        assert_eq!(line.position_of(StopId(2)), Some(1));
        assert_eq!(line.position_after(StopId(2), 1), Some(3));
        assert_eq!(line.position_after(StopId(4), 4), None);
        assert_eq!(line.position_of(StopId(9)), None);
    }

    #[test]
    fn identity_equality_ignores_content() {
        let route = Route::new(1, "1", RouteKind::Bus);
        let a = Line::new(10, route.clone(), stops(&[1, 2])).unwrap();
        let b = Line::new(11, route.clone(), stops(&[1, 2])).unwrap();
        let c = Line::new(10, route, stops(&[5])).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert!(a < b);
    }

    #[test]
    fn metro_kind() {
        let metro = Route::new(1, "M1", RouteKind::Metro);
        let line = Line::new(1, metro, stops(&[1, 2])).unwrap();
        assert!(line.is_metro());
        assert!(!RouteKind::Tram.is_metro());
    }
}
