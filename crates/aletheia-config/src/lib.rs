//! Typed configuration for Aletheia.
//!
//! This crate loads the settings an application applies to the Aletheia
//! runtime:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! [`AletheiaConfig`] has three sections:
//!
//! - `stream` - default [`StreamOptions`](aletheia_core::StreamOptions)
//! - `resources` - [`MonitorOptions`](aletheia_core::MonitorOptions) for the
//!   global resource monitor
//! - `telemetry` - [`TelemetrySection`], converted into the telemetry crate's
//!   runtime configuration
//!
//! # Example
//!
//! ```no_run
//! use aletheia_config::ConfigLoader;
//!
//! # fn main() -> Result<(), aletheia_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("aletheia.toml")?
//!     .with_env_prefix("ALETHEIA")
//!     .load()?;
//!
//! println!("leak report limit: {}", config.resources.leak_report_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [stream]
//! infinite = true
//! max_size = 10000
//!
//! [resources]
//! warn_on_leak = true
//! track_type_names = true
//! leak_report_limit = 20
//!
//! [telemetry]
//! service_name = "ingest"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with variables of the form `PREFIX__SECTION__KEY`:
//!
//! - `ALETHEIA__STREAM__MAX_SIZE=5000`
//! - `ALETHEIA__RESOURCES__LEAK_REPORT_LIMIT=100`
//! - `ALETHEIA__TELEMETRY__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::*;
