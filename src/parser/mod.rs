//! Decoders for the raw JSON blobs attached to an inbound

pub mod inbound_settings;
pub mod stream_settings;

pub use inbound_settings::{Fallback, InboundSettings};
pub use stream_settings::{Endpoint, Network, RealitySettings, Security, StreamSettings};
