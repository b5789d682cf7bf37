//! Settings loading

pub mod settings;

pub use settings::{CyroSettings, ProviderSettings, RoutingSettings, SecuritySettings};
