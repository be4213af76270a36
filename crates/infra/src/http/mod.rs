//! Shared HTTP client used by every outbound adapter

pub mod client;

pub use client::{read_json, status_error, HttpClient, HttpClientBuilder};
