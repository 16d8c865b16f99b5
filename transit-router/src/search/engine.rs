//! The search strategy contract.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::info;

use crate::domain::{Stop, StopId, TransportProfile};
use crate::graph::PathGraph;

use super::path::{Decision, OptimalPath};

/// Endpoint stops grouped by the vertex they can be reached on.
pub type EndpointGroups = BTreeMap<usize, BTreeSet<Stop>>;

/// A route search strategy over one profile's `PathGraph`.
///
/// A query runs the stages in order: grouping, direct paths, transfer
/// search when direct paths are insufficient, transformation, filtering.
/// Implementations are read-only over the graph and may be shared between
/// concurrent queries.
pub trait SearchEngine {
    /// Group candidate start or end stops by the vertices passing through
    /// them.
    ///
    /// A start stop only counts for a line that continues after it; an end
    /// stop only for a line that reaches it after its origin.
    fn group_endpoint_vertices(
        &self,
        stops: &[Stop],
        is_start: bool,
        profile: &TransportProfile,
        graph: &PathGraph,
    ) -> EndpointGroups;

    /// Journeys needing no transfer: a vertex in both groups that reaches
    /// an end stop after a start stop.
    fn find_direct_paths(
        &self,
        start: &EndpointGroups,
        end: &EndpointGroups,
        graph: &PathGraph,
    ) -> Vec<OptimalPath>;

    /// Raw transfer journeys from any start vertex to any end vertex.
    fn find_transfer_decisions(
        &self,
        start: &EndpointGroups,
        end: &EndpointGroups,
        graph: &PathGraph,
    ) -> Vec<Decision>;

    /// Turn decisions into journeys.
    ///
    /// Works on any slice of a decision list: transforming chunks and
    /// concatenating gives the same journeys as one call over the whole
    /// list, and order within a slice is preserved.
    fn transform_decisions(&self, decisions: &[Decision], graph: &PathGraph) -> Vec<OptimalPath>;

    /// Remove journeys whose second ride starts inside the start zone.
    ///
    /// Such a journey walks back to where the passenger could have boarded
    /// in the first place.
    fn discard_implausible_results(&self, candidates: &mut Vec<OptimalPath>, start_stops: &[Stop]) {
        let start: HashSet<StopId> = start_stops.iter().map(|s| s.id).collect();
        let before = candidates.len();
        candidates.retain(|path| {
            !path
                .way()
                .nth(1)
                .and_then(<[Stop]>::first)
                .is_some_and(|s| start.contains(&s.id))
        });
        let removed = before - candidates.len();
        if removed > 0 {
            info!(
                removed,
                candidates = before,
                "Discarded implausible results re-entering the start zone"
            );
        }
    }
}
