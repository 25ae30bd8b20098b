//! Prometheus metrics for Aletheia.
//!
//! The core crate records through the `metrics` facade. This module installs
//! the Prometheus recorder behind that facade and describes the standard
//! metrics. No HTTP listener is started; embedders expose
//! [`MetricsRegistry::render`] however they serve other endpoints.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `aletheia_stream_cache_hits_total` | Counter | `operation` | Answers served from a stream cache |
//! | `aletheia_stream_cache_misses_total` | Counter | `operation` | Answers computed by traversal |
//! | `aletheia_stream_elements_pulled_total` | Counter | - | Elements pulled from sources |
//! | `aletheia_open_resources` | Gauge | - | Registered, unclosed resources |
//! | `aletheia_resources_closed_total` | Counter | - | Resources closed |
//! | `aletheia_resource_close_failures_total` | Counter | - | Failed close routines |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use aletheia_core::{observe, ResourceMonitor};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name, attached to every metric as the `service` label.
    pub service_name: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "aletheia".to_string(),
        }
    }
}

/// Metrics registry for Aletheia.
///
/// Renders everything recorded through the facade in Prometheus format.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    handle: PrometheusHandle,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with the given handle.
    #[must_use]
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Returns the registry of the installed recorder, if any.
    #[must_use]
    pub fn global() -> Option<Self> {
        METRICS_HANDLE.get().cloned().map(Self::new)
    }

    /// Renders all metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initializes the metrics subsystem.
///
/// Installing twice is an error; the first recorder stays in place.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if a recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for all standard metrics.
fn register_metric_descriptions() {
    describe_counter!(
        observe::CACHE_HITS,
        "Stream cache answers served without traversal"
    );
    describe_counter!(
        observe::CACHE_MISSES,
        "Stream cache answers computed by traversing the source"
    );
    describe_counter!(
        observe::ELEMENTS_PULLED,
        "Elements pulled from once-traversable sources"
    );
    describe_gauge!(
        observe::OPEN_RESOURCES,
        "Resources registered with a monitor and not yet closed"
    );
    describe_counter!(
        observe::RESOURCES_CLOSED,
        "Resources closed and deregistered"
    );
    describe_counter!(
        observe::CLOSE_FAILURES,
        "Resource close routines that returned an error"
    );
}

/// Sets the open-resources gauge to the monitor's current count.
///
/// Resources registered before the recorder was installed are not reflected
/// in the incremental gauge; call this once after [`init_metrics`].
pub fn sync_open_resources(monitor: &ResourceMonitor) {
    gauge!(observe::OPEN_RESOURCES).set(monitor.open_count() as f64);
}
