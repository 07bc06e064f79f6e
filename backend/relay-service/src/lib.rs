/// Relay Service Library
///
/// Realtime relay for Free Fall. Clients hold a WebSocket open; every event
/// one client sends is re-broadcast to the others.
///
/// # Modules
///
/// - `relay`: Hub, event contract and per-connection session actor
/// - `routes`: WebSocket upgrade, health and metrics endpoints
/// - `bind`: Port selection with fallbacks
pub mod bind;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod relay;
pub mod routes;

pub use config::Config;
pub use error::RelayError;
pub use relay::{FanoutMode, RelayHub};
pub use routes::RelayState;
