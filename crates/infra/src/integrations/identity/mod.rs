//! Identity-provider adapter

mod client;

pub use client::HttpIdentityProvider;
