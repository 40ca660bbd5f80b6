//! Composer REST Service
//!
//! Exposes the composer over HTTP so any chat bridge can drive it.
//!
//! ## Endpoints
//!
//! - `POST /api/events` - Deliver an inbound event, returns the outbound requests
//! - `GET /api/catalog?page=n` - One picker page of the catalog
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_dispatch};
pub use routes::create_router;
pub use state::ServiceState;
