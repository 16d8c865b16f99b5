//! Result ranking for search results.

use std::collections::HashSet;

use super::path::OptimalPath;

/// Rank journeys by preference and keep the best `max_results`.
///
/// Journeys are ranked by:
/// 1. Number of transfers (fewer is better)
/// 2. Stops travelled (fewer is better)
///
/// Ties keep their input order. Duplicates are removed first.
pub fn rank_paths(paths: Vec<OptimalPath>, max_results: usize) -> Vec<OptimalPath> {
    let mut paths = deduplicate(paths);
    paths.sort_by_key(|p| (p.transfers(), p.stops_ridden()));
    paths.truncate(max_results);
    paths
}

/// Remove journeys riding the same lines between the same stops.
///
/// The first occurrence wins.
pub fn deduplicate(paths: Vec<OptimalPath>) -> Vec<OptimalPath> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.key())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineId, Stop};
    use crate::fixtures::{bus, stop};
    use crate::search::path::Segment;

    fn stops() -> Vec<Stop> {
        (1..=8).map(|i| stop(i, 100.0 * i as f64, 0.0)).collect()
    }

    fn path(rides: &[(u32, usize, usize)]) -> OptimalPath {
        let stops = stops();
        let all: Vec<&Stop> = stops.iter().collect();
        OptimalPath::new(
            rides
                .iter()
                .map(|(id, b, a)| Segment::ride(&bus(*id, &all), *b, *a).unwrap())
                .collect(),
        )
    }

    #[test]
    fn fewer_transfers_first() {
        let one_change = path(&[(1, 0, 1), (2, 1, 2)]);
        let direct_long = path(&[(3, 0, 7)]);
        let ranked = rank_paths(vec![one_change, direct_long], 10);
        assert_eq!(ranked[0].lines().collect::<Vec<_>>(), vec![LineId(3)]);
    }

    #[test]
    fn fewer_stops_breaks_ties() {
        let long = path(&[(1, 0, 6)]);
        let short = path(&[(2, 0, 3)]);
        let ranked = rank_paths(vec![long, short], 10);
        assert_eq!(ranked[0].stops_ridden(), 3);
        assert_eq!(ranked[1].stops_ridden(), 6);
    }

    #[test]
    fn duplicates_removed() {
        let a = path(&[(1, 0, 2), (2, 2, 4)]);
        let b = path(&[(1, 0, 2), (2, 2, 4)]);
        let c = path(&[(1, 0, 2), (2, 2, 5)]);
        assert_eq!(deduplicate(vec![a, b, c]).len(), 2);
    }

    #[test]
    fn truncated_to_max_results() {
        let paths = (1..=5).map(|id| path(&[(id, 0, id as usize)])).collect();
        let ranked = rank_paths(paths, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[2].stops_ridden(), 3);
    }

    #[test]
    fn empty_input() {
        assert!(rank_paths(Vec::new(), 10).is_empty());
    }
}
