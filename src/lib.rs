pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod settings;
pub mod utils;

// Re-export the main entry points for easier access
pub use interfaces::{
    ClashSubscription, FileInventory, SourceError, SubClashService, SubscriptionError,
    SubscriptionSource,
};
pub use models::{Client, ClientTraffic, Inbound, Protocol};
pub use settings::Settings;
