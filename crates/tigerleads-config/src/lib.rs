//! KDL configuration parsing for Tiger Leads.
//!
//! This crate handles parsing of the system configuration file
//! (`tigerleads.kdl`) and environment overrides.

pub mod error;
pub mod system;

pub use error::{ConfigError, ConfigResult};
pub use system::{
    DatabaseConfig, FeedConfig, LifecycleConfig, RateLimitConfig, ServerConfig, SystemConfig,
    UnlockCapConfig, load_system_config, parse_system_config,
};
