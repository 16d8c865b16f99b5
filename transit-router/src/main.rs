use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_router::domain::{Coord, ProfileId};
use transit_router::geometry::{Haversine, RTreeIndexer};
use transit_router::graph::{BuildConfig, GraphBuilder, GraphRegistry};
use transit_router::search::{BfsEngine, RouteSearch, SearchConfig};
use transit_router::store::{DataAccess, MemoryStore};

const USAGE: &str = "usage: transit-router [PROFILE START_LAT START_LON END_LAT END_LON]";

/// Read an environment override, keeping `default` when unset or invalid.
fn env_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, default = %default, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

/// A query given on the command line.
struct Query {
    profile: ProfileId,
    start: Coord,
    end: Coord,
}

fn parse_query(args: &[String]) -> Result<Option<Query>, String> {
    match args {
        [] => Ok(None),
        [profile, start_lat, start_lon, end_lat, end_lon] => {
            let num = |s: &String| s.parse::<f64>().map_err(|e| format!("{s}: {e}"));
            Ok(Some(Query {
                profile: ProfileId(profile.parse().map_err(|e| format!("{profile}: {e}"))?),
                start: Coord::new(num(start_lat)?, num(start_lon)?),
                end: Coord::new(num(end_lat)?, num(end_lon)?),
            }))
        }
        _ => Err(USAGE.to_string()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = match parse_query(&args) {
        Ok(q) => q,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let defaults = BuildConfig::default();
    let build_config = BuildConfig::new(
        env_or("TRANSIT_WORKERS", defaults.workers),
        env_or("TRANSIT_PROFILE_TIMEOUT_SECS", defaults.profile_timeout_secs),
    );
    let search_config = SearchConfig {
        max_transfers: env_or("TRANSIT_MAX_TRANSFERS", SearchConfig::default().max_transfers),
        ..SearchConfig::default()
    };

    let snapshot =
        std::env::var("TRANSIT_SNAPSHOT").unwrap_or_else(|_| "snapshot.json".to_string());
    info!(path = %snapshot, "Loading network snapshot");
    let store = match MemoryStore::load(&snapshot).await {
        Ok(store) => store,
        Err(e) => {
            error!(path = %snapshot, error = %e, "Failed to load snapshot");
            return ExitCode::FAILURE;
        }
    };

    let builder = Arc::new(GraphBuilder::new(Haversine, RTreeIndexer::new(Haversine)));
    let registry = GraphRegistry::new();
    match registry.initialize(&store, &builder, &build_config).await {
        Ok(report) if !report.is_complete() => {
            warn!(
                unavailable = report.failed.len(),
                "Some profiles have no route search"
            );
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Graph registry initialization failed");
            return ExitCode::FAILURE;
        }
    }

    let Some(query) = query else {
        info!(profiles = registry.len(), "Graphs ready");
        return ExitCode::SUCCESS;
    };

    let profile = match store.profiles().await {
        Ok(profiles) => profiles.into_iter().find(|p| p.id == query.profile),
        Err(e) => {
            error!(error = %e, "Failed to list profiles");
            return ExitCode::FAILURE;
        }
    };
    let Some(profile) = profile else {
        error!(profile = %query.profile, "Unknown profile");
        return ExitCode::FAILURE;
    };

    let search = match RouteSearch::new(
        registry,
        BfsEngine::from_config(&search_config),
        RTreeIndexer::new(Haversine),
        search_config,
    ) {
        Ok(search) => search,
        Err(e) => {
            error!(error = %e, "Invalid search settings");
            return ExitCode::FAILURE;
        }
    };

    match search.search(query.start, query.end, &profile).await {
        Ok(paths) if paths.is_empty() => {
            println!("No route found");
            ExitCode::SUCCESS
        }
        Ok(paths) => {
            for (i, path) in paths.iter().enumerate() {
                println!(
                    "{}. {} ({} transfers, {} stops)",
                    i + 1,
                    path,
                    path.transfers(),
                    path.stops_ridden()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Search failed");
            ExitCode::FAILURE
        }
    }
}
