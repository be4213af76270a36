//! Account records: feedback, newsletter, alpha signups and export

pub mod ports;
pub mod service;

pub use service::{validate_email, AccountDeps, AccountService};
