//! Configuration system for symkeep.
//!
//! This module provides hierarchical configuration with support for:
//! - YAML configuration files (global config and directory `.symkeep.yaml`)
//! - Environment variable overrides
//! - Programmatic configuration via builder pattern
//! - Per-record overrides embedded in the record itself
//!
//! # Configuration Precedence
//!
//! Configuration is merged from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. The record's embedded config (via [`ResolvedConfig::layered`])
//! 2. Programmatic overrides (via `ConfigBuilder::with_config`)
//! 3. Environment variables (`SYMKEEP_*`)
//! 4. Directory config (`.symkeep.yaml`, nearest ancestor)
//! 5. Global config (`~/.symkeep/config.yaml`)
//! 6. Built-in defaults
//!
//! # Examples
//!
//! Basic usage with defaults:
//!
//! ```no_run
//! use symkeep::config::{ConfigBuilder, ResolvedConfig};
//!
//! let config = ConfigBuilder::new().build().unwrap();
//! let resolved = ResolvedConfig::from_config(&config);
//! println!("strategy: {}", resolved.timestamp_strategy);
//! ```
//!
//! Programmatic configuration:
//!
//! ```
//! use symkeep::config::{Config, ConfigBuilder};
//!
//! let custom = Config {
//!     concurrency_limit: Some(2),
//!     ..Default::default()
//! };
//!
//! let config = ConfigBuilder::new()
//!     .skip_files()
//!     .skip_env()
//!     .with_config(custom)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.concurrency_limit, Some(2));
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod resolved;
pub mod schema;
pub mod validator;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{default_data_dir, ConfigLoader, ConfigSource};
pub use merger::ConfigMerger;
pub use resolved::ResolvedConfig;
pub use schema::Config;
pub use validator::ConfigValidator;
