//! Parallel decision transformation.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::graph::PathGraph;

use super::engine::SearchEngine;
use super::error::SearchError;
use super::path::{Decision, OptimalPath};

/// Transformation of one chunk of decisions, run on the blocking pool.
pub struct TransformTask<E> {
    engine: Arc<E>,
    graph: Arc<PathGraph>,
    decisions: Vec<Decision>,
}

impl<E: SearchEngine> TransformTask<E> {
    pub fn new(engine: Arc<E>, graph: Arc<PathGraph>, decisions: Vec<Decision>) -> Self {
        Self {
            engine,
            graph,
            decisions,
        }
    }

    pub fn run(self) -> Vec<OptimalPath> {
        self.engine.transform_decisions(&self.decisions, &self.graph)
    }
}

/// Transform `decisions` in chunks of `chunk_size`, one task per chunk.
///
/// Chunk results are concatenated in chunk order.
pub async fn transform_in_parallel<E>(
    engine: &Arc<E>,
    graph: &Arc<PathGraph>,
    decisions: Vec<Decision>,
    chunk_size: usize,
) -> Result<Vec<OptimalPath>, SearchError>
where
    E: SearchEngine + Send + Sync + 'static,
{
    if decisions.is_empty() {
        return Ok(Vec::new());
    }
    let chunk_size = chunk_size.max(1);
    let tasks: Vec<_> = decisions
        .chunks(chunk_size)
        .map(|chunk| {
            let task = TransformTask::new(Arc::clone(engine), Arc::clone(graph), chunk.to_vec());
            tokio::task::spawn_blocking(move || task.run())
        })
        .collect();
    debug!(
        decisions = decisions.len(),
        tasks = tasks.len(),
        "Transforming decisions"
    );

    let mut paths = Vec::with_capacity(decisions.len());
    for result in join_all(tasks).await {
        paths.extend(result.map_err(|e| SearchError::Worker(e.to_string()))?);
    }
    Ok(paths)
}
