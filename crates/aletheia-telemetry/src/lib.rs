//! Logging and metrics for Aletheia.
//!
//! The core crate emits `tracing` events and `metrics` facade updates but
//! installs nothing. This crate wires both up for an application:
//!
//! - **Logging**: JSON or pretty output through `tracing-subscriber`
//! - **Metrics**: a Prometheus recorder, rendered on demand
//! - **Leak reports**: open resources of the global monitor are logged when
//!   the [`TelemetryGuard`] is dropped
//!
//! # Example
//!
//! ```no_run
//! use aletheia_telemetry::{init_telemetry, TelemetryConfig, TelemetryError};
//!
//! fn main() -> Result<(), TelemetryError> {
//!     let config = TelemetryConfig::builder()
//!         .service_name("ingest")
//!         .build();
//!
//!     let _guard = init_telemetry(config)?;
//!     Ok(())
//! }
//! ```
//!
//! # Rendered Metrics
//!
//! ```text
//! # HELP aletheia_stream_cache_hits_total Stream cache answers served without traversal
//! # TYPE aletheia_stream_cache_hits_total counter
//! aletheia_stream_cache_hits_total{operation="has_any_ok",service="ingest"} 12
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, MetricsConfig, MetricsRegistry};

use aletheia_core::ResourceMonitor;
use std::sync::Arc;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Guard that reports leaked resources on drop.
///
/// This guard should be kept alive for the lifetime of the application.
/// When dropped, every resource still registered with its monitor is logged
/// at `warn`.
#[derive(Debug)]
pub struct TelemetryGuard {
    monitor: Option<Arc<ResourceMonitor>>,
}

impl TelemetryGuard {
    /// Creates a new telemetry guard.
    #[must_use]
    pub fn new(monitor: Option<Arc<ResourceMonitor>>) -> Self {
        Self { monitor }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            let leaked = monitor.report_leaks();
            if leaked == 0 {
                tracing::debug!("no open resources at shutdown");
            }
        }
    }
}

/// Initializes all telemetry subsystems.
///
/// Logging is installed first so that metrics setup can log.
///
/// # Errors
///
/// Returns `TelemetryError` if any subsystem fails to initialize.
pub fn init_telemetry(config: TelemetryConfig) -> TelemetryResult<TelemetryGuard> {
    init_logging(&config.logging)?;

    init_metrics(&config.metrics)?;

    let monitor = ResourceMonitor::global();
    if config.metrics.enabled {
        metrics::sync_open_resources(&monitor);
    }

    Ok(TelemetryGuard::new(
        config.report_leaks_on_shutdown.then_some(monitor),
    ))
}
