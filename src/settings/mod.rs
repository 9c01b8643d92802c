//! Settings module for clashsub
//!
//! Configuration is read once at startup and handed to the service by value.

pub mod settings_struct;

pub use settings_struct::{Settings, SettingsError};
