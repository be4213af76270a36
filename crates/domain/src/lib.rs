//! # PS-LANG Domain
//!
//! Business domain types and models for the PS-LANG account service.
//!
//! This crate contains:
//! - Domain data types (tiers, connector credentials, conversations)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other PS-LANG crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
