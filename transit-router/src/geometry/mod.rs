//! Geometry collaborators.
//!
//! Graph construction only needs two things from geometry: a distance that
//! is meaningful for "closer than" comparisons, and a way to find the stops
//! around a point. Both are traits; the shipped index is an R-tree.

use std::fmt;

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::domain::{Coord, Stop};

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const EARTH_RADIUS_METERS: f64 = 6_372_797.560856;
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * DEG_TO_RAD;
/// Search boxes are widened by this factor so they never clip the circle.
const BOX_MARGIN: f64 = 1.1;
const MIN_COS_LAT: f64 = 1e-6;

/// Straight-line distance between two coordinates.
pub trait Geometry {
    /// Distance in metres.
    fn distance(&self, from: Coord, to: Coord) -> f64;

    /// Distance between two stops.
    fn stop_distance(&self, from: &Stop, to: &Stop) -> f64 {
        self.distance(from.coord(), to.coord())
    }
}

/// Great-circle distance on a spherical earth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Haversine;

impl Geometry for Haversine {
    fn distance(&self, from: Coord, to: Coord) -> f64 {
        let longitude_arc = (from.lon - to.lon) * DEG_TO_RAD;
        let latitude_arc = (from.lat - to.lat) * DEG_TO_RAD;
        let latitude_h = (latitude_arc * 0.5).sin().powi(2);
        let longitude_h = (longitude_arc * 0.5).sin().powi(2);
        let tmp = (from.lat * DEG_TO_RAD).cos() * (to.lat * DEG_TO_RAD).cos();
        EARTH_RADIUS_METERS * 2.0 * (latitude_h + tmp * longitude_h).sqrt().asin()
    }
}

/// Radius search over an indexed set of stops.
pub trait SpatialIndex {
    /// Indexed stops within `radius` metres of `center`, in index order.
    ///
    /// A stop located exactly at `center` with the given `exclude` id is not
    /// returned; callers add the center stop themselves when they need it.
    fn stops_within_radius(
        &self,
        center: Coord,
        exclude: Option<&Stop>,
        radius: f64,
    ) -> Vec<Stop>;
}

/// Builds a `SpatialIndex` over one set of stops.
///
/// Graph construction indexes a profile's stops once per build; queries
/// index a graph's stops once per served graph.
pub trait SpatialIndexer {
    type Index: SpatialIndex + Send + Sync + 'static;

    fn index(&self, stops: &[Stop]) -> Self::Index;
}

/// Stops bulk-loaded into an R-tree keyed by (lon, lat).
///
/// The tree narrows a query to a degree box around the center; `geometry`
/// decides what is actually inside the radius.
pub struct StopTree<G> {
    geometry: G,
    stops: Vec<Stop>,
    tree: RTree<GeomWithData<[f64; 2], usize>>,
}

impl<G: Geometry> StopTree<G> {
    pub fn new(geometry: G, stops: &[Stop]) -> Self {
        let points: Vec<GeomWithData<[f64; 2], usize>> = stops
            .iter()
            .enumerate()
            .map(|(i, s)| GeomWithData::new([s.lon, s.lat], i))
            .collect();
        Self {
            geometry,
            stops: stops.to_vec(),
            tree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

impl<G: Geometry> SpatialIndex for StopTree<G> {
    fn stops_within_radius(
        &self,
        center: Coord,
        exclude: Option<&Stop>,
        radius: f64,
    ) -> Vec<Stop> {
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&search_box(center, radius))
            .map(|point| point.data)
            .filter(|&i| {
                let stop = &self.stops[i];
                exclude.is_none_or(|e| e.id != stop.id)
                    && self.geometry.distance(center, stop.coord()) <= radius
            })
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| self.stops[i].clone()).collect()
    }
}

impl<G> fmt::Debug for StopTree<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopTree")
            .field("stops", &self.stops.len())
            .finish()
    }
}

/// Indexes stop sets into `StopTree`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RTreeIndexer<G> {
    geometry: G,
}

impl<G> RTreeIndexer<G> {
    pub fn new(geometry: G) -> Self {
        Self { geometry }
    }
}

impl<G: Geometry + Clone + Send + Sync + 'static> SpatialIndexer for RTreeIndexer<G> {
    type Index = StopTree<G>;

    fn index(&self, stops: &[Stop]) -> StopTree<G> {
        StopTree::new(self.geometry.clone(), stops)
    }
}

/// Degree box around `center` holding every point within `radius` metres.
fn search_box(center: Coord, radius: f64) -> AABB<[f64; 2]> {
    let dlat = radius / METERS_PER_DEGREE * BOX_MARGIN;
    let cos_lat = (center.lat * DEG_TO_RAD).cos().abs().max(MIN_COS_LAT);
    let dlon = (dlat / cos_lat).min(180.0);
    AABB::from_corners(
        [center.lon - dlon, center.lat - dlat],
        [center.lon + dlon, center.lat + dlat],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        let c = Coord::new(53.9, 27.56);
        assert_eq!(Haversine.distance(c, c), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = Haversine.distance(Coord::new(0.0, 0.0), Coord::new(1.0, 0.0));
        // ~111.2 km
        assert!((d - 111_226.0).abs() < 200.0, "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = Coord::new(53.90, 27.55);
        let b = Coord::new(53.91, 27.57);
        let d1 = Haversine.distance(a, b);
        let d2 = Haversine.distance(b, a);
        assert!((d1 - d2).abs() < 1e-6);
    }

    #[test]
    fn stop_tree_excludes_center() {
        let center = Stop::new(1, "Center", 53.9000, 27.5500);
        let near = Stop::new(2, "Near", 53.9005, 27.5500); // ~55 m
        let far = Stop::new(3, "Far", 53.9100, 27.5500); // ~1.1 km
        let all = vec![center.clone(), near.clone(), far];

        let tree = RTreeIndexer::new(Haversine).index(&all);
        assert_eq!(tree.len(), 3);
        let found = tree.stops_within_radius(center.coord(), Some(&center), 100.0);
        assert_eq!(found, vec![near.clone()]);

        let found = tree.stops_within_radius(center.coord(), None, 100.0);
        assert_eq!(found, vec![center, near]);
    }

    #[test]
    fn stop_tree_box_does_not_clip_east_west() {
        // At 60 degrees north a degree of longitude is about half as long
        let center = Coord::new(60.0, 10.0);
        let east = Stop::new(1, "East", 60.0, 10.0017); // ~94 m
        let beyond = Stop::new(2, "Beyond", 60.0, 10.0020); // ~111 m
        let tree = StopTree::new(Haversine, &[beyond, east.clone()]);

        assert_eq!(tree.stops_within_radius(center, None, 100.0), vec![east]);
    }

    #[test]
    fn stop_tree_returns_index_order() {
        let stops: Vec<Stop> = (0..20u32)
            .rev()
            .map(|i| Stop::new(i, format!("S{i}"), 0.0, i as f64 * 1e-4))
            .collect();
        let tree = StopTree::new(Haversine, &stops);
        let found = tree.stops_within_radius(Coord::new(0.0, 0.0), None, 10_000.0);
        assert_eq!(found, stops);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The tree finds exactly the stops a full distance scan finds.
            #[test]
            fn stop_tree_matches_full_scan(
                coords in prop::collection::vec((-0.01f64..0.01, -0.01f64..0.01), 1..60),
                center in (-0.01f64..0.01, -0.01f64..0.01),
                radius in 0.0f64..1500.0,
            ) {
                let stops: Vec<Stop> = coords
                    .iter()
                    .enumerate()
                    .map(|(i, (lat, lon))| Stop::new(i as u32, format!("S{i}"), 53.9 + lat, 27.5 + lon))
                    .collect();
                let center = Coord::new(53.9 + center.0, 27.5 + center.1);

                let expected: Vec<Stop> = stops
                    .iter()
                    .filter(|s| Haversine.distance(center, s.coord()) <= radius)
                    .cloned()
                    .collect();
                let tree = StopTree::new(Haversine, &stops);
                prop_assert_eq!(tree.stops_within_radius(center, None, radius), expected);
            }
        }
    }
}
