//! Inbound protocol-settings parsing
//!
//! Like the transport descriptor, the settings blob is decoded best effort:
//! an undecodable blob means no cipher method, no clients and no fallbacks.

use log::debug;
use serde_json::Value;

use super::stream_settings::decode_object;
use crate::models::Client;

/// A fallback route declared by a master inbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    /// Destination, e.g. `@vless-ws` or `8080`
    pub dest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundSettings {
    /// Shadowsocks cipher method
    pub method: Option<String>,
    pub clients: Vec<Client>,
    pub fallbacks: Vec<Fallback>,
}

impl InboundSettings {
    /// Decode a raw settings blob. Never fails.
    pub fn parse(raw: &str) -> Self {
        let Some(settings) = decode_object(raw) else {
            if !raw.trim().is_empty() {
                debug!("Ignoring undecodable inbound settings: {}", raw);
            }
            return InboundSettings::default();
        };

        let method = settings
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);

        let clients = settings
            .get("clients")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| match serde_json::from_value::<Client>(entry.clone()) {
                        Ok(client) => Some(client),
                        Err(e) => {
                            debug!("Skipping malformed client entry: {}", e);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let fallbacks = settings
            .get("fallbacks")
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(parse_fallback).collect())
            .unwrap_or_default();

        InboundSettings {
            method,
            clients,
            fallbacks,
        }
    }

    /// Whether any fallback of this inbound routes to `dest`.
    pub fn has_fallback_to(&self, dest: &str) -> bool {
        self.fallbacks.iter().any(|fallback| fallback.dest == dest)
    }
}

fn parse_fallback(entry: &Value) -> Option<Fallback> {
    let dest = match entry.as_object()?.get("dest")? {
        Value::String(dest) => dest.clone(),
        Value::Number(port) => port.to_string(),
        _ => return None,
    };
    Some(Fallback { dest })
}
