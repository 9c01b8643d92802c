//! File-backed inventory
//!
//! A JSON document shaped like the panel's own inbound export:
//!
//! ```json
//! {
//!   "inbounds": [
//!     {
//!       "id": 1,
//!       "protocol": "vless",
//!       "port": 443,
//!       "settings": "{\"clients\":[{\"id\":\"...\",\"email\":\"alice\",\"enable\":true,\"subId\":\"a\"}]}",
//!       "streamSettings": "{\"network\":\"tcp\",\"security\":\"reality\"}",
//!       "clientStats": [{"email": "alice", "up": 1, "down": 2, "total": 0, "expiryTime": 0}]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FallbackMaster, SourceError, SubscriptionSource};
use crate::models::{Client, Inbound};
use crate::parser::stream_settings::decode_object;
use crate::parser::InboundSettings;

/// Keys a fallback child takes over from its master's transport descriptor
const INHERITED_STREAM_KEYS: [&str; 4] = [
    "security",
    "tlsSettings",
    "realitySettings",
    "externalProxy",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInventory {
    pub inbounds: Vec<Inbound>,
}

impl FileInventory {
    pub fn new(inbounds: Vec<Inbound>) -> Self {
        FileInventory { inbounds }
    }

    pub fn from_json_str(content: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let inventory = Self::from_json_str(&content)?;
        info!(
            "Loaded {} inbound(s) from {}",
            inventory.inbounds.len(),
            path.display()
        );
        Ok(inventory)
    }
}

impl SubscriptionSource for FileInventory {
    fn inbounds_by_sub_id(&self, sub_id: &str) -> Result<Vec<Inbound>, SourceError> {
        Ok(self
            .inbounds
            .iter()
            .filter(|inbound| inbound.enable)
            .filter(|inbound| {
                InboundSettings::parse(&inbound.settings)
                    .clients
                    .iter()
                    .any(|client| client.sub_id == sub_id)
            })
            .cloned()
            .collect())
    }

    fn clients(&self, inbound: &Inbound) -> Result<Vec<Client>, SourceError> {
        let settings = InboundSettings::parse(&inbound.settings);
        if settings.clients.is_empty() {
            return Err(SourceError::NotFound(format!(
                "no clients on inbound {}",
                inbound.id
            )));
        }
        Ok(settings.clients)
    }

    fn fallback_master(
        &self,
        listen: &str,
        stream_settings: &str,
    ) -> Result<FallbackMaster, SourceError> {
        let master = self
            .inbounds
            .iter()
            .find(|inbound| InboundSettings::parse(&inbound.settings).has_fallback_to(listen))
            .ok_or_else(|| SourceError::NotFound(format!("fallback master for {}", listen)))?;
        debug!("Inbound listening on {} falls back from inbound {}", listen, master.id);

        let mut stream = decode_object(stream_settings).unwrap_or_default();
        let master_stream = decode_object(&master.stream_settings).unwrap_or_default();
        for key in INHERITED_STREAM_KEYS {
            match master_stream.get(key) {
                Some(value) => {
                    stream.insert(key.to_string(), value.clone());
                }
                None => {
                    stream.remove(key);
                }
            }
        }

        Ok(FallbackMaster {
            listen: master.listen.clone(),
            port: master.port,
            stream_settings: serde_json::to_string(&Value::Object(stream))?,
        })
    }
}
