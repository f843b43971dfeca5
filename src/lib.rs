//! divforms - multi-tenant, schema-versioned form backend
//!
//! Divisions own screens, screens carry versioned JSON schemas, and users
//! submit payloads validated against the active schema for a
//! (division, screen) pair they have been granted.
//!
//! Subsystems:
//! - `schema`: dialect selection, sanitization, compilation, validator cache
//! - `forms`: versioning, submission validation, catalog management
//! - `auth`: users, roles, tokens, access gate
//! - `store`: repository traits and in-memory collections
//! - `http_server`: Axum routes
//! - `observability`, `cli`

pub mod auth;
pub mod cli;
pub mod forms;
pub mod http_server;
pub mod observability;
pub mod schema;
pub mod store;
