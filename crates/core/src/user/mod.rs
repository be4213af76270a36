//! Identity provider access and admin operations

pub mod admin;
pub mod ports;

pub use admin::{require_role, AdminService, DEFAULT_ADMIN_LIMIT};
