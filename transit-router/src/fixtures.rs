//! Network fixtures shared by unit tests.
//!
//! Stops are placed on a local plane around (0, 0), in metres, so scenario
//! distances can be read straight off the coordinates.

use crate::domain::{Coord, Line, Route, RouteKind, Stop, TransportProfile};
use crate::geometry::{Haversine, RTreeIndexer};
use crate::graph::GraphBuilder;

/// Metres per degree at the equator for the haversine earth radius.
pub const METERS_PER_DEGREE: f64 = 111_226.0;

/// A stop `x` metres east and `y` metres north of (0, 0).
pub fn stop(id: u32, x: f64, y: f64) -> Stop {
    Stop::new(
        id,
        format!("Stop {id}"),
        y / METERS_PER_DEGREE,
        x / METERS_PER_DEGREE,
    )
}

/// The coordinate `x` metres east and `y` metres north of (0, 0).
pub fn point(x: f64, y: f64) -> Coord {
    Coord::new(y / METERS_PER_DEGREE, x / METERS_PER_DEGREE)
}

pub fn line(id: u32, route: u32, kind: RouteKind, way: &[&Stop]) -> Line {
    let route = Route::new(route, format!("R{route}"), kind);
    Line::new(id, route, way.iter().map(|s| (*s).clone()).collect()).unwrap()
}

/// A bus line on its own route.
pub fn bus(id: u32, way: &[&Stop]) -> Line {
    line(id, id, RouteKind::Bus, way)
}

/// A metro line on its own route.
pub fn metro(id: u32, way: &[&Stop]) -> Line {
    line(id, id, RouteKind::Metro, way)
}

pub fn profile(radius: f64) -> TransportProfile {
    TransportProfile::new(1, "Test", radius)
}

pub fn builder() -> GraphBuilder<Haversine, RTreeIndexer<Haversine>> {
    GraphBuilder::new(Haversine, RTreeIndexer::new(Haversine))
}

/// Collect all stops of some lines, without duplicates.
pub fn stops_of(lines: &[Line]) -> Vec<Stop> {
    let mut stops: Vec<Stop> = lines.iter().flat_map(|l| l.way().iter().cloned()).collect();
    stops.sort();
    stops.dedup();
    stops
}
