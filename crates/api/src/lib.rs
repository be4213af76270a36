//! # PS-LANG API
//!
//! HTTP layer - routes, request authentication and the application context.
//!
//! This crate contains:
//! - The axum router and handlers
//! - Session extractors backed by the identity provider
//! - The JSON error boundary
//! - Application context (dependency injection)
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Handlers stay thin; behavior lives in `pslang-core` services

pub mod auth;
pub mod context;
pub mod error;
pub mod routes;
pub mod utils;

pub use context::{Adapters, AnalyticsFactory, AppContext};
pub use error::{ApiError, ApiResult};
pub use routes::router;
