use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents a complete Clash subscription document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashYamlOutput {
    pub proxies: Vec<ClashProxy>,
    pub proxy_groups: Vec<ClashProxyGroup>,
    pub rules: Vec<String>,
}

/// Options every proxy entry carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommonProxyOptions {
    pub name: String,
    pub server: String,
    pub port: u16,
}

impl CommonProxyOptions {
    pub fn new(name: String, server: String, port: u16) -> Self {
        Self { name, server, port }
    }
}

/// Protocol-specific part of a proxy entry, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolOptions {
    #[serde(rename = "vmess")]
    VMess {
        uuid: String,
        #[serde(rename = "alterId")]
        alter_id: u32,
        cipher: String,
    },
    #[serde(rename = "vless")]
    Vless { uuid: String, encryption: String },
    #[serde(rename = "trojan")]
    Trojan { password: String },
    #[serde(rename = "ss")]
    Shadowsocks {
        password: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cipher: Option<String>,
    },
}

/// Transport and security part of a proxy entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransportOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(rename = "publicKey", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(rename = "shortId", default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
}

/// Represents a single proxy in Clash configuration
///
/// An entry for an unrecognized protocol has no `protocol` part and is written
/// with the common and transport fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClashProxy {
    #[serde(flatten)]
    pub common: CommonProxyOptions,
    #[serde(flatten)]
    pub protocol: Option<ProtocolOptions>,
    #[serde(flatten)]
    pub transport: TransportOptions,
}

impl ClashProxy {
    pub fn new(common: CommonProxyOptions) -> Self {
        Self {
            common,
            protocol: None,
            transport: TransportOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.common.name
    }
}

/// Represents a proxy group in Clash configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClashProxyGroup {
    #[serde(rename = "select")]
    Select { name: String, proxies: Vec<String> },
}

impl ClashProxyGroup {
    pub fn name(&self) -> &str {
        match self {
            ClashProxyGroup::Select { name, .. } => name,
        }
    }

    pub fn proxies(&self) -> &[String] {
        match self {
            ClashProxyGroup::Select { proxies, .. } => proxies,
        }
    }

    pub fn proxies_mut(&mut self) -> &mut Vec<String> {
        match self {
            ClashProxyGroup::Select { proxies, .. } => proxies,
        }
    }
}
