//! Clash document generation
//!
//! `exports` turns inbounds and clients into proxy entries and renders the
//! document; `yaml` holds the output schema and group scaffolding.

pub mod exports;
pub mod yaml;

pub use exports::clash::{proxy_to_clash, proxy_to_clash_yaml, subscription_userinfo};
pub use exports::proxy_to_clash::{
    dedupe_proxy_names, inbound_to_clash, protocol_options, transport_options, ExportSettings,
};
pub use yaml::clash_output::{
    ClashProxy, ClashProxyGroup, ClashYamlOutput, CommonProxyOptions, ProtocolOptions,
    TransportOptions,
};
