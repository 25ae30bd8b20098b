//! Main configuration types.
//!
//! This module provides the top-level [`AletheiaConfig`] struct and its builder.

use aletheia_core::{MonitorOptions, StreamOptions};
use aletheia_telemetry::logging::create_env_filter;
use aletheia_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, LogFormat, TelemetrySection};

/// Complete Aletheia configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use aletheia_config::AletheiaConfig;
///
/// let config = AletheiaConfig::default();
/// assert!(!config.stream.infinite);
/// assert_eq!(config.resources.leak_report_limit, 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AletheiaConfig {
    /// Default options for streams built by the application.
    #[serde(default)]
    pub stream: StreamOptions,

    /// Options of the global resource monitor.
    #[serde(default)]
    pub resources: MonitorOptions,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl AletheiaConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use aletheia_config::AletheiaConfig;
    /// use aletheia_core::StreamOptions;
    ///
    /// let config = AletheiaConfig::builder()
    ///     .stream(StreamOptions::infinite(10_000))
    ///     .build();
    ///
    /// assert!(config.stream.infinite);
    /// ```
    #[must_use]
    pub fn builder() -> AletheiaConfigBuilder {
        AletheiaConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` or `ConfigError::ValidationError` if:
    /// - the stream hints contradict each other
    /// - `stream.max_size` is set on a finite stream
    /// - the service name is blank
    /// - the log level is not a valid filter directive
    pub fn validate(&self) -> ConfigResult<()> {
        let stream = &self.stream;
        if stream.known_empty && (stream.known_non_empty || stream.known_ok || stream.known_err) {
            return Err(ConfigError::validation_error(
                "stream.known_empty cannot be combined with known_non_empty, known_ok or known_err",
            ));
        }

        if !stream.infinite && stream.max_size > 0 {
            return Err(ConfigError::invalid_value(
                "stream.max_size",
                "only applies when stream.infinite is true",
            ));
        }

        if self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "telemetry.service_name",
                "must not be blank",
            ));
        }

        if self.telemetry.logging.enabled {
            create_env_filter(&self.telemetry.logging.level).map_err(|e| {
                ConfigError::invalid_value("telemetry.logging.level", e.to_string())
            })?;
        }

        Ok(())
    }

    /// Options for streams created from this configuration.
    #[must_use]
    pub fn stream_options(&self) -> StreamOptions {
        self.stream.clone()
    }

    /// Options to apply to the resource monitor.
    #[must_use]
    pub fn monitor_options(&self) -> MonitorOptions {
        self.resources.clone()
    }

    /// Runtime telemetry configuration.
    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        self.telemetry.to_telemetry_config()
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors and source locations
    /// - Debug log level
    /// - Leak reports list every open resource
    ///
    /// # Example
    ///
    /// ```
    /// use aletheia_config::AletheiaConfig;
    ///
    /// let config = AletheiaConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;

        config.resources.leak_report_limit = usize::MAX;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Handle type names are not recorded
    ///
    /// # Example
    ///
    /// ```
    /// use aletheia_config::{AletheiaConfig, LogFormat};
    ///
    /// let config = AletheiaConfig::production();
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;

        config.resources.track_type_names = false;

        config
    }
}

/// Builder for [`AletheiaConfig`].
#[derive(Debug, Default)]
pub struct AletheiaConfigBuilder {
    stream: Option<StreamOptions>,
    resources: Option<MonitorOptions>,
    telemetry: Option<TelemetrySection>,
}

impl AletheiaConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stream options.
    #[must_use]
    pub fn stream(mut self, stream: StreamOptions) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Set the resource monitor options.
    #[must_use]
    pub fn resources(mut self, resources: MonitorOptions) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Set the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> AletheiaConfig {
        AletheiaConfig {
            stream: self.stream.unwrap_or_default(),
            resources: self.resources.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> ConfigResult<AletheiaConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
