//! Layered configuration
//!
//! Three layers, later layers winning key by key:
//! 1. Built-in defaults
//! 2. Site config file (TOML)
//! 3. CLI overrides

mod effective;
mod merge;
mod settings;

pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
pub use settings::{
    LoggingSettings, MessageSettings, NotificationSettings, TransitionSettings, WorkflowSettings,
};
