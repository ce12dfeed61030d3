// CharacterSync - Share game settings between characters
//
// This is the library crate containing the redirect policy, the gearset file
// reader and the gearset reconciliation engine.
// The binary crate (main.rs) provides a command line front end.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::SyncMetrics;
pub use models::{GearsetInfo, GearsetLayout, GearsetName, SyncConfig, SyncFlags};
pub use services::CharacterSync;
pub use state::SharedConfig;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
