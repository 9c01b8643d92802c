//! Subscription service and the collaborators it depends on

pub mod inventory;
pub mod subscription;

use thiserror::Error;

use crate::models::{Client, ClientTraffic, Inbound};

pub use inventory::FileInventory;
pub use subscription::{ClashSubscription, SubClashService};

/// Errors reported by a [`SubscriptionSource`]
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by [`SubClashService::get_clash_yaml`]
#[derive(Error, Debug)]
pub enum SubscriptionError {
    /// Looking up the subscriber's inbounds failed
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to serialize Clash YAML: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Where a fallback inbound is actually reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackMaster {
    pub listen: String,
    pub port: u16,
    pub stream_settings: String,
}

/// Read access to the panel's inbound inventory
pub trait SubscriptionSource {
    /// Inbounds holding at least one client of subscription `sub_id`
    fn inbounds_by_sub_id(&self, sub_id: &str) -> Result<Vec<Inbound>, SourceError>;

    /// Client credentials configured on `inbound`
    fn clients(&self, inbound: &Inbound) -> Result<Vec<Client>, SourceError>;

    /// Resolve the master inbound that serves the fallback listen tag
    /// `listen`, merging its security settings into `stream_settings`
    fn fallback_master(
        &self,
        listen: &str,
        stream_settings: &str,
    ) -> Result<FallbackMaster, SourceError>;

    /// Usage record of `email` within `stats`; zero-valued when absent
    fn client_traffic(&self, stats: &[ClientTraffic], email: &str) -> ClientTraffic {
        stats
            .iter()
            .find(|traffic| traffic.email == email)
            .cloned()
            .unwrap_or_else(|| ClientTraffic {
                email: email.to_string(),
                ..Default::default()
            })
    }
}
