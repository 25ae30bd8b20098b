//! Telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name (used in metrics and logs).
    pub service_name: String,

    /// Metrics configuration.
    pub metrics: MetricsConfig,

    /// Logging configuration.
    pub logging: LogConfig,

    /// Whether the guard reports open resources of the global monitor
    /// when dropped.
    pub report_leaks_on_shutdown: bool,
}

impl TelemetryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::new()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "aletheia".to_string(),
            metrics: MetricsConfig::default(),
            logging: LogConfig::default(),
            report_leaks_on_shutdown: true,
        }
    }
}

/// Builder for [`TelemetryConfig`].
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    service_name: Option<String>,
    metrics: Option<MetricsConfig>,
    logging: Option<LogConfig>,
    report_leaks_on_shutdown: Option<bool>,
}

impl TelemetryConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn service_name(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Sets the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, config: MetricsConfig) -> Self {
        self.metrics = Some(config);
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn logging(mut self, config: LogConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// Sets the log filter directive, keeping other logging settings.
    #[must_use]
    pub fn log_level(mut self, level: &str) -> Self {
        let config = self.logging.take().unwrap_or_default();
        self.logging = Some(LogConfig {
            level: level.to_string(),
            ..config
        });
        self
    }

    /// Enables or disables the shutdown leak report.
    #[must_use]
    pub fn report_leaks_on_shutdown(mut self, enabled: bool) -> Self {
        self.report_leaks_on_shutdown = Some(enabled);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let defaults = TelemetryConfig::default();

        let service_name = self.service_name.unwrap_or(defaults.service_name);

        // Update sub-configs with service info
        let mut metrics = self.metrics.unwrap_or(defaults.metrics);
        metrics.service_name = service_name.clone();

        let mut logging = self.logging.unwrap_or(defaults.logging);
        logging.service_name = service_name.clone();

        TelemetryConfig {
            service_name,
            metrics,
            logging,
            report_leaks_on_shutdown: self
                .report_leaks_on_shutdown
                .unwrap_or(defaults.report_leaks_on_shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "aletheia");
        assert!(config.report_leaks_on_shutdown);
    }

    #[test]
    fn test_builder_propagates_service_name() {
        let config = TelemetryConfig::builder()
            .service_name("ingest")
            .build();

        assert_eq!(config.metrics.service_name, "ingest");
        assert_eq!(config.logging.service_name, "ingest");
    }

    #[test]
    fn test_builder_log_level_keeps_format() {
        let config = TelemetryConfig::builder()
            .logging(LogConfig::development())
            .log_level("aletheia_core=trace")
            .build();

        assert_eq!(config.logging.level, "aletheia_core=trace");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_builder_leak_report_toggle() {
        let config = TelemetryConfig::builder()
            .report_leaks_on_shutdown(false)
            .build();
        assert!(!config.report_leaks_on_shutdown);
    }
}
