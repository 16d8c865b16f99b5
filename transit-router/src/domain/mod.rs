//! Domain types for the transit router.
//!
//! Stops, routes, lines and transport profiles as loaded from the data
//! store. Values are read-only once constructed and compare by identity.

mod error;
mod line;
mod profile;
mod stop;

pub use error::DomainError;
pub use line::{Line, LineId, Route, RouteId, RouteKind};
pub use profile::{ConfigurationError, ProfileId, TransportProfile};
pub use stop::{Coord, MOCK_STOP_NAME, Stop, StopId};
