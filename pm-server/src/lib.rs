//! Property Manager Server - the HTTP surface.
//!
//! Exposes CRUD routes for the five entities, relationship reads, and the
//! chat endpoints backed by per-session conversations. Built on axum with
//! tower-http CORS and request tracing.

pub mod error;
pub mod state;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, serve};
pub use state::{AppState, SessionLimits, SessionStore};
