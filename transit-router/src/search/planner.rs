//! Query entry point.

use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use tracing::{debug, info};

use crate::domain::{Coord, ProfileId, Stop, TransportProfile};
use crate::geometry::{SpatialIndex, SpatialIndexer};
use crate::graph::{GraphRegistry, PathGraph};

use super::config::SearchConfig;
use super::engine::SearchEngine;
use super::error::SearchError;
use super::path::{Decision, OptimalPath};
use super::rank::rank_paths;
use super::transform::transform_in_parallel;

/// Answers "how do I get from here to there" for one profile at a time.
///
/// Holds the registry it reads graphs from; queries never write to it.
pub struct RouteSearch<E, S: SpatialIndexer> {
    registry: GraphRegistry,
    engine: Arc<E>,
    spatial: S,
    /// Stop index of the graph last served per profile.
    indexes: Cache<ProfileId, Arc<GraphStops<S::Index>>>,
    config: SearchConfig,
}

/// Radius index over the stops of one graph.
struct GraphStops<I> {
    graph: Arc<PathGraph>,
    index: I,
}

/// Everything the planning stages need, owned so it can move to a worker.
struct Query {
    graph: Arc<PathGraph>,
    profile: TransportProfile,
    start_stops: Vec<Stop>,
    end_stops: Vec<Stop>,
}

impl<E, S> RouteSearch<E, S>
where
    E: SearchEngine + Send + Sync + 'static,
    S: SpatialIndexer,
{
    pub fn new(
        registry: GraphRegistry,
        engine: E,
        spatial: S,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            registry,
            engine: Arc::new(engine),
            spatial,
            indexes: Cache::builder().name("query-stop-indexes").build(),
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find journeys between two points, best first.
    ///
    /// Start and end stops are those within the profile's access radius of
    /// each point. The whole query runs under the configured deadline.
    pub async fn search(
        &self,
        start: Coord,
        end: Coord,
        profile: &TransportProfile,
    ) -> Result<Vec<OptimalPath>, SearchError> {
        validate_point("start", start)?;
        validate_point("end", end)?;

        let graph = self
            .registry
            .get(profile.id)
            .await
            .ok_or(SearchError::ProfileUnavailable(profile.id))?;

        let started = Instant::now();
        let deadline = self.config.deadline();
        let stops = self.graph_stops(profile.id, &graph).await;
        let radius = profile.access_zone_radius;
        let query = Query {
            start_stops: stops.index.stops_within_radius(start, None, radius),
            end_stops: stops.index.stops_within_radius(end, None, radius),
            graph,
            profile: profile.clone(),
        };

        let paths = tokio::time::timeout(deadline, self.run(query))
            .await
            .map_err(|_| SearchError::Timeout(deadline))??;

        info!(
            profile = %profile.id,
            results = paths.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search complete"
        );
        Ok(paths)
    }

    /// The stop index of `graph`, built on first use after each rebuild.
    async fn graph_stops(
        &self,
        profile: ProfileId,
        graph: &Arc<PathGraph>,
    ) -> Arc<GraphStops<S::Index>> {
        if let Some(cached) = self.indexes.get(&profile).await
            && Arc::ptr_eq(&cached.graph, graph)
        {
            return cached;
        }
        let indexed = Arc::new(GraphStops {
            graph: Arc::clone(graph),
            index: self.spatial.index(graph.stops()),
        });
        self.indexes.insert(profile, Arc::clone(&indexed)).await;
        debug!(profile = %profile, stops = graph.stops().len(), "Indexed graph stops");
        indexed
    }

    async fn run(&self, query: Query) -> Result<Vec<OptimalPath>, SearchError> {
        let engine = Arc::clone(&self.engine);
        let config = self.config.clone();
        let graph = Arc::clone(&query.graph);

        // Grouping and traversal are CPU-bound; keep them off the runtime.
        let (start_stops, mut paths, decisions) =
            tokio::task::spawn_blocking(move || plan(engine.as_ref(), &config, query))
                .await
                .map_err(|e| SearchError::Worker(e.to_string()))??;

        if !decisions.is_empty() {
            let transformed = transform_in_parallel(
                &self.engine,
                &graph,
                decisions,
                self.config.transform_chunk_size,
            )
            .await?;
            debug!(paths = transformed.len(), "Transformed transfer decisions");
            paths.extend(transformed);
        }

        self.engine
            .discard_implausible_results(&mut paths, &start_stops);
        Ok(rank_paths(paths, self.config.max_results))
    }
}

/// Start stops, direct journeys and pending transfer decisions.
type Planned = (Vec<Stop>, Vec<OptimalPath>, Vec<Decision>);

/// Grouping, direct search and transfer search for one query.
fn plan<E: SearchEngine>(
    engine: &E,
    config: &SearchConfig,
    query: Query,
) -> Result<Planned, SearchError> {
    let Query {
        graph,
        profile,
        start_stops,
        end_stops,
    } = query;

    let start = engine.group_endpoint_vertices(&start_stops, true, &profile, &graph);
    if start.is_empty() {
        return Err(SearchError::NoStartVertices);
    }
    let end = engine.group_endpoint_vertices(&end_stops, false, &profile, &graph);
    if end.is_empty() {
        return Err(SearchError::NoEndVertices);
    }

    let direct = engine.find_direct_paths(&start, &end, &graph);
    debug!(profile = %profile.id, direct = direct.len(), "Direct path search done");

    let decisions = if direct.len() < config.min_direct_results {
        let decisions = engine.find_transfer_decisions(&start, &end, &graph);
        debug!(
            profile = %profile.id,
            decisions = decisions.len(),
            "Transfer search done"
        );
        decisions
    } else {
        Vec::new()
    };

    Ok((start_stops, direct, decisions))
}

fn validate_point(which: &str, point: Coord) -> Result<(), SearchError> {
    let valid = point.lat.is_finite()
        && point.lon.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lon);
    if valid {
        Ok(())
    } else {
        Err(SearchError::InvalidRequest(format!(
            "{which} point ({}, {}) is not a valid coordinate",
            point.lat, point.lon
        )))
    }
}
