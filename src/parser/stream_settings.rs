//! Transport descriptor parsing
//!
//! An inbound's `streamSettings` blob is decoded once into [`StreamSettings`].
//! Decoding is best effort: a blob that is not a JSON object yields
//! `StreamSettings::default()`, i.e. no transport metadata at all, and a field
//! of the wrong shape is treated as absent.
//!
//! Two layouts are understood. The flat one carries client-facing keys
//! directly (`network`, `ws-path`, `publicKey`, ...). The nested one is the
//! server layout (`wsSettings`, `realitySettings`, ...). Flat keys win.

use log::debug;
use serde_json::{Map, Value};

/// Header map copied into the output untouched.
pub type HeaderMap = Map<String, Value>;

/// Network kind and its per-kind options.
#[derive(Debug, Clone, PartialEq)]
pub enum Network {
    Ws {
        path: Option<String>,
        headers: Option<HeaderMap>,
    },
    Http {
        headers: Option<HeaderMap>,
    },
    /// Any other kind, passed through by name only
    Other(String),
}

impl Network {
    pub fn name(&self) -> &str {
        match self {
            Network::Ws { .. } => "ws",
            Network::Http { .. } => "http",
            Network::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealitySettings {
    pub public_key: Option<String>,
    pub fingerprint: Option<String>,
    pub short_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Security {
    Tls,
    Reality(RealitySettings),
}

/// A destination a client should dial instead of the inbound's own address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub dest: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(dest: impl Into<String>, port: u16) -> Self {
        Endpoint {
            dest: dest.into(),
            port,
        }
    }
}

/// Decoded transport descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSettings {
    pub network: Option<Network>,
    pub security: Option<Security>,
    /// Explicit endpoints with malformed entries dropped. `None` when the
    /// descriptor lists none; `Some(vec![])` when every listed entry was bad.
    pub external_proxies: Option<Vec<Endpoint>>,
}

impl StreamSettings {
    /// Decode a raw transport descriptor. Never fails.
    pub fn parse(raw: &str) -> Self {
        match decode_object(raw) {
            Some(stream) => Self::from_object(&stream),
            None => {
                if !raw.trim().is_empty() {
                    debug!("Ignoring undecodable stream settings: {}", raw);
                }
                StreamSettings::default()
            }
        }
    }

    fn from_object(stream: &Map<String, Value>) -> Self {
        StreamSettings {
            network: parse_network(stream),
            security: parse_security(stream),
            external_proxies: parse_external_proxies(stream),
        }
    }

    /// The explicit endpoints, or the single `(host, port)` default when the
    /// descriptor lists none. A listed but entirely malformed set yields no
    /// endpoints at all.
    pub fn endpoints(&self, host: &str, port: u16) -> Vec<Endpoint> {
        match &self.external_proxies {
            Some(endpoints) => endpoints.clone(),
            None => vec![Endpoint::new(host, port)],
        }
    }
}

/// Decode `raw` as a JSON object. `None` when it is not one; callers treat
/// that as "nothing configured", not as an error.
pub(crate) fn decode_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn get_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn get_object<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    map.get(key).and_then(Value::as_object)
}

/// Walk nested objects along `path`.
fn get_path<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for key in parents {
        current = get_object(current, key)?;
    }
    current.get(*last)
}

fn parse_network(stream: &Map<String, Value>) -> Option<Network> {
    let name = get_str(stream, "network")?;
    let network = match name.as_str() {
        "ws" => Network::Ws {
            path: get_str(stream, "ws-path").or_else(|| {
                get_path(stream, &["wsSettings", "path"])
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }),
            headers: get_object(stream, "ws-headers")
                .or_else(|| get_path(stream, &["wsSettings", "headers"]).and_then(Value::as_object))
                .cloned(),
        },
        "http" => Network::Http {
            headers: get_object(stream, "http-headers")
                .or_else(|| {
                    get_path(stream, &["httpSettings", "headers"]).and_then(Value::as_object)
                })
                .cloned(),
        },
        _ => Network::Other(name),
    };
    Some(network)
}

fn parse_security(stream: &Map<String, Value>) -> Option<Security> {
    match get_str(stream, "security")?.as_str() {
        "tls" => Some(Security::Tls),
        "reality" => Some(Security::Reality(parse_reality(stream))),
        _ => None,
    }
}

fn parse_reality(stream: &Map<String, Value>) -> RealitySettings {
    let nested = |key: &str| {
        get_path(stream, &["realitySettings", "settings", key])
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    RealitySettings {
        public_key: get_str(stream, "publicKey").or_else(|| nested("publicKey")),
        fingerprint: get_str(stream, "fingerprint").or_else(|| nested("fingerprint")),
        short_id: get_str(stream, "shortId").or_else(|| {
            get_path(stream, &["realitySettings", "shortIds"])
                .and_then(Value::as_array)
                .and_then(|ids| ids.first())
                .and_then(Value::as_str)
                .map(str::to_string)
        }),
    }
}

fn parse_external_proxies(stream: &Map<String, Value>) -> Option<Vec<Endpoint>> {
    let entries = stream
        .get("externalProxy")
        .and_then(Value::as_array)
        .filter(|entries| !entries.is_empty())?;
    let endpoints = entries
        .iter()
        .filter_map(|entry| {
            let endpoint = parse_endpoint(entry);
            if endpoint.is_none() {
                debug!("Skipping malformed external proxy entry: {}", entry);
            }
            endpoint
        })
        .collect();
    Some(endpoints)
}

fn parse_endpoint(entry: &Value) -> Option<Endpoint> {
    let entry = entry.as_object()?;
    let dest = entry.get("dest")?.as_str()?;
    let port = entry.get("port")?;
    let port = port
        .as_u64()
        .or_else(|| port.as_f64().filter(|p| p.fract() == 0.0 && *p >= 0.0).map(|p| p as u64))?;
    let port = u16::try_from(port).ok()?;
    Some(Endpoint::new(dest, port))
}
