//! Inbound and client records as stored by the panel
//!
//! These are read-only inputs to subscription generation. The raw `settings`
//! and `stream_settings` blobs stay as JSON strings here; decoding them is the
//! job of [`crate::parser`].

use serde::{Deserialize, Serialize};

use super::traffic::ClientTraffic;

/// Proxy protocol served by an inbound.
///
/// Tags the panel stores that are not one of the four subscription protocols
/// are kept verbatim in [`Protocol::Unknown`], so they serialize back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    VMess,
    Vless,
    Trojan,
    Shadowsocks,
    Unknown(String),
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Unknown(String::new())
    }
}

impl Protocol {
    /// Parse a protocol tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "vmess" => Protocol::VMess,
            "vless" => Protocol::Vless,
            "trojan" => Protocol::Trojan,
            "shadowsocks" => Protocol::Shadowsocks,
            _ => Protocol::Unknown(tag.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Protocol::VMess => "vmess",
            Protocol::Vless => "vless",
            Protocol::Trojan => "trojan",
            Protocol::Shadowsocks => "shadowsocks",
            Protocol::Unknown(tag) => tag,
        }
    }
}

impl From<String> for Protocol {
    fn from(tag: String) -> Self {
        Protocol::from_tag(&tag)
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// A server-side listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inbound {
    pub id: u32,
    pub remark: String,
    pub enable: bool,
    pub tag: String,
    pub protocol: Protocol,
    pub listen: String,
    pub port: u16,
    /// Protocol settings blob (clients, cipher method, fallbacks)
    pub settings: String,
    /// Transport descriptor blob
    pub stream_settings: String,
    pub client_stats: Vec<ClientTraffic>,
}

impl Default for Inbound {
    fn default() -> Self {
        Inbound {
            id: 0,
            remark: String::new(),
            enable: true,
            tag: String::new(),
            protocol: Protocol::default(),
            listen: String::new(),
            port: 0,
            settings: String::new(),
            stream_settings: String::new(),
            client_stats: Vec::new(),
        }
    }
}

/// A client credential attached to an inbound.
///
/// Missing keys decode to their zero values; in particular a client without
/// an `enable` key is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    pub id: String,
    pub email: String,
    pub password: String,
    pub security: String,
    pub enable: bool,
    pub sub_id: String,
}

impl Client {
    /// Whether this credential contributes to the subscription `sub_id`.
    pub fn belongs_to(&self, sub_id: &str) -> bool {
        self.enable && self.sub_id == sub_id
    }
}
