//! Per-profile graph registry.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use moka::future::Cache;
use tracing::{debug, error, info, warn};

use crate::domain::{ProfileId, TransportProfile};
use crate::geometry::{Geometry, SpatialIndexer};
use crate::store::DataAccess;

use super::builder::{GraphBuilder, load_profile_data};
use super::config::BuildConfig;
use super::error::BuildError;
use super::path_graph::PathGraph;

/// Outcome of registry initialization.
#[derive(Debug, Default)]
pub struct InitReport {
    /// Profiles whose graph is now served, ascending id.
    pub built: Vec<ProfileId>,
    /// Profiles left out, with the reason.
    pub failed: Vec<(ProfileId, BuildError)>,
}

impl InitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Built graphs keyed by profile.
///
/// Graphs are immutable once inserted and handed out as `Arc`s, so readers
/// never block each other. A profile whose build failed is simply absent.
#[derive(Clone)]
pub struct GraphRegistry {
    graphs: Cache<ProfileId, Arc<PathGraph>>,
}

impl GraphRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            graphs: Cache::builder().name("path-graphs").build(),
        }
    }

    /// Build the graph of every profile in `store`.
    ///
    /// Up to `config.workers` profiles are built at once, each under the
    /// per-profile timeout. Failures are logged and reported; they never
    /// abort the other builds. Only listing the profiles themselves, or an
    /// invalid `config`, fails the whole initialization.
    pub async fn initialize<D, G, S>(
        &self,
        store: &D,
        builder: &Arc<GraphBuilder<G, S>>,
        config: &BuildConfig,
    ) -> Result<InitReport, BuildError>
    where
        D: DataAccess + Sync,
        G: Geometry + Send + Sync + 'static,
        S: SpatialIndexer + Send + Sync + 'static,
    {
        config.validate()?;
        let profiles = store.profiles().await?;
        let started = Instant::now();
        info!(
            profiles = profiles.len(),
            workers = config.workers,
            "Initializing graph registry"
        );

        // Each graph is served as soon as its own build finishes.
        let outcomes: Vec<(ProfileId, Result<(), BuildError>)> = stream::iter(profiles)
            .map(|profile| async move {
                let result = match build_profile(store, builder, &profile, config).await {
                    Ok(graph) => {
                        self.graphs.insert(profile.id, Arc::new(graph)).await;
                        debug!(profile = %profile.id, "Graph published");
                        Ok(())
                    }
                    Err(e) => {
                        error!(profile = %profile.id, error = %e, "Graph build failed, profile unavailable");
                        Err(e)
                    }
                };
                (profile.id, result)
            })
            .buffer_unordered(config.workers)
            .collect()
            .await;

        let mut report = InitReport::default();
        for (id, result) in outcomes {
            match result {
                Ok(()) => report.built.push(id),
                Err(e) => report.failed.push((id, e)),
            }
        }
        report.built.sort();
        report.failed.sort_by_key(|(id, _)| *id);

        info!(
            built = report.built.len(),
            failed = report.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Graph registry initialized"
        );
        Ok(report)
    }

    /// Rebuild one profile's graph and swap it in.
    ///
    /// On failure the previously served graph, if any, stays in place.
    pub async fn rebuild<D, G, S>(
        &self,
        store: &D,
        builder: &Arc<GraphBuilder<G, S>>,
        profile: &TransportProfile,
        config: &BuildConfig,
    ) -> Result<Arc<PathGraph>, BuildError>
    where
        D: DataAccess + Sync,
        G: Geometry + Send + Sync + 'static,
        S: SpatialIndexer + Send + Sync + 'static,
    {
        config.validate()?;
        match build_profile(store, builder, profile, config).await {
            Ok(graph) => {
                let graph = Arc::new(graph);
                self.graphs.insert(profile.id, Arc::clone(&graph)).await;
                info!(profile = %profile.id, "Graph rebuilt");
                Ok(graph)
            }
            Err(e) => {
                warn!(profile = %profile.id, error = %e, "Graph rebuild failed, keeping previous graph");
                Err(e)
            }
        }
    }

    /// The graph of a profile, if it was built.
    pub async fn get(&self, profile: ProfileId) -> Option<Arc<PathGraph>> {
        self.graphs.get(&profile).await
    }

    pub fn contains(&self, profile: ProfileId) -> bool {
        self.graphs.contains_key(&profile)
    }

    /// Ids of every served profile, ascending.
    pub fn profiles(&self) -> Vec<ProfileId> {
        let mut ids: Vec<ProfileId> = self.graphs.iter().map(|(id, _)| *id).collect();
        ids.sort();
        ids
    }

    /// Number of served profiles.
    pub fn len(&self) -> usize {
        self.graphs.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GraphRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and build one profile under the configured timeout.
///
/// The analysis itself runs on the blocking pool. On timeout the blocking
/// task is detached and its result discarded.
async fn build_profile<D, G, S>(
    store: &D,
    builder: &Arc<GraphBuilder<G, S>>,
    profile: &TransportProfile,
    config: &BuildConfig,
) -> Result<PathGraph, BuildError>
where
    D: DataAccess + Sync,
    G: Geometry + Send + Sync + 'static,
    S: SpatialIndexer + Send + Sync + 'static,
{
    let after = config.profile_timeout();
    let work = async {
        let (lines, stops) = load_profile_data(store, profile).await?;
        let builder = Arc::clone(builder);
        let profile = profile.clone();
        tokio::task::spawn_blocking(move || builder.build(&profile, lines, stops))
            .await
            .map_err(|e| BuildError::Worker(e.to_string()))?
    };

    tokio::time::timeout(after, work)
        .await
        .map_err(|_| BuildError::Timeout {
            profile: profile.id,
            after,
        })?
}
