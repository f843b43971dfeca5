//! # divforms HTTP Server Module
//!
//! Combines all endpoint routers into a single Axum server.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/auth/*` - Registration, login, profile
//! - `/admin/*` - User administration
//! - `/meta/*` - Divisions, screens, form definitions
//! - `/access/*` - Access grants
//! - `/forms/*` - Schema retrieval and submissions
//! - `/observability/*` - Metrics

pub mod access_routes;
pub mod admin_routes;
pub mod auth_routes;
pub mod config;
pub mod errors;
pub mod extract;
pub mod form_routes;
pub mod meta_routes;
pub mod observability_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use extract::CurrentUser;
pub use server::{build_router, AppState, HttpServer, StateOptions};
