//! Core data models for subscription generation
//!
//! Inbounds, client credentials and usage records are owned by the panel and
//! handed to this crate read-only. Everything else is built fresh per request.

mod inbound;
mod traffic;

pub use inbound::{Client, Inbound, Protocol};
pub use traffic::ClientTraffic;
