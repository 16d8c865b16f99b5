//! In-memory snapshot store.
//!
//! Holds fully resolved profiles, loaded once from a JSON snapshot file or
//! assembled directly in code. A profile whose lines do not resolve stays
//! listed; reading its lines reports why, so only that profile goes without
//! a graph.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::error;

use super::{DataAccess, DataAccessError};
use crate::domain::{Line, LineId, ProfileId, Route, RouteId, Stop, StopId, TransportProfile};

/// Snapshot file layout: every profile with its stops, routes and lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub profiles: Vec<ProfileRecord>,
}

/// One profile in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(flatten)]
    pub profile: TransportProfile,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

/// A line as stored: references to its route and stops by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRecord {
    pub id: LineId,
    pub route: RouteId,
    pub stops: Vec<StopId>,
}

#[derive(Debug, Clone)]
struct ProfileData {
    profile: TransportProfile,
    stops: Vec<Stop>,
    /// Resolved lines, or why they could not be resolved.
    lines: Result<Vec<Line>, String>,
}

/// Data store backed by resolved in-memory snapshots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    profiles: BTreeMap<ProfileId, ProfileData>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and resolve a JSON snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DataAccessError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// Resolve a JSON snapshot document.
    pub fn from_json(json: &str) -> Result<Self, DataAccessError> {
        let snapshot: Snapshot =
            serde_json::from_str(json).map_err(|e| DataAccessError::Json {
                message: e.to_string(),
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Resolve stop and route references of every line in the snapshot.
    ///
    /// Resolution is per profile: a dangling reference only marks its own
    /// profile as malformed.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        for record in snapshot.profiles {
            let lines = resolve_lines(&record).map_err(|e| {
                error!(profile = %record.profile.id, error = %e, "Malformed profile data");
                e.to_string()
            });
            store.profiles.insert(
                record.profile.id,
                ProfileData {
                    profile: record.profile,
                    stops: record.stops,
                    lines,
                },
            );
        }
        store
    }

    /// Add or replace a profile with already resolved data.
    pub fn insert(&mut self, profile: TransportProfile, stops: Vec<Stop>, lines: Vec<Line>) {
        self.profiles.insert(
            profile.id,
            ProfileData {
                profile,
                stops,
                lines: Ok(lines),
            },
        );
    }

    /// Number of profiles held.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn profile_data(&self, id: ProfileId) -> Result<&ProfileData, DataAccessError> {
        self.profiles
            .get(&id)
            .ok_or(DataAccessError::UnknownProfile(id))
    }
}

impl DataAccess for MemoryStore {
    async fn profiles(&self) -> Result<Vec<TransportProfile>, DataAccessError> {
        Ok(self.profiles.values().map(|p| p.profile.clone()).collect())
    }

    async fn lines(&self, profile: ProfileId) -> Result<Vec<Line>, DataAccessError> {
        self.profile_data(profile)?
            .lines
            .clone()
            .map_err(|reason| DataAccessError::Malformed { profile, reason })
    }

    async fn stops(&self, profile: ProfileId) -> Result<Vec<Stop>, DataAccessError> {
        Ok(self.profile_data(profile)?.stops.clone())
    }
}

/// Lines of one profile record with their route and stops looked up.
fn resolve_lines(record: &ProfileRecord) -> Result<Vec<Line>, DataAccessError> {
    let stops_by_id: HashMap<StopId, &Stop> = record.stops.iter().map(|s| (s.id, s)).collect();
    let routes_by_id: HashMap<RouteId, &Route> =
        record.routes.iter().map(|r| (r.id, r)).collect();

    let mut lines = Vec::with_capacity(record.lines.len());
    for line in &record.lines {
        let route = routes_by_id
            .get(&line.route)
            .ok_or(DataAccessError::UnknownRoute {
                line: line.id,
                route: line.route,
            })?;
        let way = line
            .stops
            .iter()
            .map(|id| {
                stops_by_id
                    .get(id)
                    .map(|s| (*s).clone())
                    .ok_or(DataAccessError::UnknownStop {
                        line: line.id,
                        stop: *id,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(Line::new(line.id.0, (*route).clone(), way)?);
    }
    Ok(lines)
}
