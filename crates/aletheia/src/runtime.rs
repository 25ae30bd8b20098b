//! Process-level setup.

use aletheia_config::{AletheiaConfig, ConfigLoader};
use aletheia_core::{ResourceMonitor, StreamOptions};
use aletheia_telemetry::{init_telemetry, TelemetryGuard};
use anyhow::Context;
use std::sync::Arc;

/// Handles that live as long as the application.
///
/// Dropping the runtime drops the telemetry guard, which reports resources
/// still open in the global monitor.
#[derive(Debug)]
pub struct Runtime {
    config: AletheiaConfig,
    monitor: Arc<ResourceMonitor>,
    _telemetry: TelemetryGuard,
}

impl Runtime {
    /// The configuration the runtime was started with.
    #[must_use]
    pub fn config(&self) -> &AletheiaConfig {
        &self.config
    }

    /// Stream options from the `[stream]` section.
    #[must_use]
    pub fn stream_options(&self) -> StreamOptions {
        self.config.stream_options()
    }

    /// The configured global monitor.
    #[must_use]
    pub fn monitor(&self) -> &Arc<ResourceMonitor> {
        &self.monitor
    }
}

/// Loads configuration from `aletheia.toml` (if present), `.env`, and
/// `PREFIX__*` variables, then calls [`init`].
pub fn bootstrap(env_prefix: &str) -> anyhow::Result<Runtime> {
    let config = ConfigLoader::new()
        .with_defaults()
        .with_optional_file("aletheia.toml")
        .context("loading aletheia.toml")?
        .with_dotenv()
        .context("loading .env")?
        .with_env_prefix(env_prefix)
        .load()
        .context("validating configuration")?;

    init(config)
}

/// Applies `config` to the global monitor and installs telemetry.
pub fn init(config: AletheiaConfig) -> anyhow::Result<Runtime> {
    config.validate().context("validating configuration")?;

    let monitor = ResourceMonitor::global();
    monitor.configure(config.monitor_options());

    let telemetry =
        init_telemetry(config.telemetry_config()).context("initializing telemetry")?;

    tracing::info!(
        service.name = %config.telemetry.service_name,
        infinite_streams = config.stream.infinite,
        "aletheia initialized"
    );

    Ok(Runtime {
        config,
        monitor,
        _telemetry: telemetry,
    })
}
