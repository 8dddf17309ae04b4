//! HTTP API Layer
//!
//! axum surface of the export pipeline: the bearer-authenticated export
//! endpoint, optional admin queue endpoints, and a health check.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod types;

pub use auth::{AccessTokenClaims, JwtDecoder};
pub use error::ApiError;
pub use router::build_router;
pub use server::{HttpServer, HttpServerConfig};
pub use state::AppState;
