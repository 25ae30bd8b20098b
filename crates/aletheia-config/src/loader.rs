//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{AletheiaConfig, ConfigError, ConfigResult, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values or a preset
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use aletheia_config::ConfigLoader;
///
/// # fn main() -> Result<(), aletheia_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("aletheia.toml")?
///     .with_env_prefix("ALETHEIA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AletheiaConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AletheiaConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is what `new()` starts from, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AletheiaConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use aletheia_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AletheiaConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AletheiaConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The extension is neither `toml` nor `json`
    /// - The content is malformed or has unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> ConfigResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let file_config = Self::parse_file(&content, path)?;
        self.merge_config(file_config);
        self.file_loaded = true;

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string.
    ///
    /// `format` is `"toml"` or `"json"`, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unsupported or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use aletheia_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [stream]
    ///     infinite = true
    ///     max_size = 1000
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.stream.max_size, 1000);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> ConfigResult<Self> {
        let file_config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => return Err(ConfigError::unsupported_format(format)),
        };

        self.merge_config(file_config);
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`. With prefix
    /// `ALETHEIA`:
    /// - `ALETHEIA__STREAM__MAX_SIZE=5000`
    /// - `ALETHEIA__RESOURCES__WARN_ON_LEAK=false`
    /// - `ALETHEIA__TELEMETRY__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment.
    ///
    /// A missing `.env` file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if a `.env` file exists but is
    /// malformed or unreadable.
    pub fn with_dotenv(self) -> ConfigResult<Self> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::read_error(
                ".env",
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            )),
        }
    }

    /// Whether a file layer has been applied.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> ConfigResult<AletheiaConfig> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> AletheiaConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> ConfigResult<AletheiaConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::unsupported_format(path.display().to_string())),
        }
    }

    // A file layer replaces whole sections; fields it omits take their
    // serde defaults, not the values of earlier layers.
    fn merge_config(&mut self, file_config: AletheiaConfig) {
        self.config = file_config;
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> ConfigResult<()> {
        let scoped = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(&scoped))
            .collect();
        // Deterministic order for reproducible error reporting.
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> ConfigResult<()> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Stream section
            ["STREAM", "INFINITE"] => config.stream.infinite = env_bool(key, value)?,
            ["STREAM", "MAX_SIZE"] => config.stream.max_size = env_usize(key, value)?,
            ["STREAM", "KNOWN_EMPTY"] => config.stream.known_empty = env_bool(key, value)?,
            ["STREAM", "KNOWN_NON_EMPTY"] => {
                config.stream.known_non_empty = env_bool(key, value)?;
            }
            ["STREAM", "KNOWN_OK"] => config.stream.known_ok = env_bool(key, value)?,
            ["STREAM", "KNOWN_ERR"] => config.stream.known_err = env_bool(key, value)?,

            // Resources section
            ["RESOURCES", "WARN_ON_LEAK"] => {
                config.resources.warn_on_leak = env_bool(key, value)?;
            }
            ["RESOURCES", "TRACK_TYPE_NAMES"] => {
                config.resources.track_type_names = env_bool(key, value)?;
            }
            ["RESOURCES", "LEAK_REPORT_LIMIT"] => {
                config.resources.leak_report_limit = env_usize(key, value)?;
            }

            // Telemetry section
            ["TELEMETRY", "SERVICE_NAME"] => {
                config.telemetry.service_name = value.to_string();
            }
            ["TELEMETRY", "REPORT_LEAKS_ON_SHUTDOWN"] => {
                config.telemetry.report_leaks_on_shutdown = env_bool(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = env_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = env_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => {
                config.telemetry.logging.level = value.to_string();
            }
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                config.telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "ANSI_ENABLED"] => {
                config.telemetry.logging.ansi_enabled = env_bool(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                config.telemetry.logging.include_location = env_bool(key, value)?;
            }

            // Unknown keys are left to other consumers of the prefix
            _ => {}
        }

        Ok(())
    }
}

fn env_bool(key: &str, value: &str) -> ConfigResult<bool> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn env_usize(key: &str, value: &str) -> ConfigResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected non-negative integer"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AletheiaConfig::default());
    }

    #[test]
    fn test_loader_with_development() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert!(!config.resources.track_type_names);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [resources]
            leak_report_limit = 5
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.resources.leak_report_limit, 5);
        assert!(config.resources.warn_on_leak);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"stream": {"known_ok": true}, "telemetry": {"service_name": "ingest"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.stream.known_ok);
        assert_eq!(config.telemetry.service_name, "ingest");
    }

    #[test]
    fn test_loader_with_string_unsupported_format() {
        let result = ConfigLoader::new().with_string("stream: {}", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_loader_string_replaces_preset() {
        let config = ConfigLoader::new()
            .with_development()
            .with_string("[stream]\ninfinite = true\n", "toml")
            .unwrap()
            .load_unvalidated();

        assert!(config.stream.infinite);
        assert_eq!(config.telemetry.logging.level, "info");
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/aletheia.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/aletheia.toml")
            .unwrap();
        assert!(!loader.file_loaded());

        let config = loader.load().unwrap();
        assert_eq!(config, AletheiaConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_layer() {
        let result = ConfigLoader::new()
            .with_string("[stream]\nmax_size = 10\n", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));

        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("Off"), Some(false));

        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    // Overrides are exercised through apply_env_var directly; mutating the
    // process environment would race with other tests.

    #[test]
    fn test_apply_env_var_stream() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__STREAM__INFINITE", "true", "TEST").unwrap();
        loader.apply_env_var("TEST__STREAM__MAX_SIZE", "5000", "TEST").unwrap();
        loader.apply_env_var("TEST__STREAM__KNOWN_NON_EMPTY", "on", "TEST").unwrap();
        assert!(loader.config.stream.infinite);
        assert_eq!(loader.config.stream.max_size, 5000);
        assert!(loader.config.stream.known_non_empty);
    }

    #[test]
    fn test_apply_env_var_resources() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__RESOURCES__WARN_ON_LEAK", "false", "TEST").unwrap();
        loader.apply_env_var("TEST__RESOURCES__LEAK_REPORT_LIMIT", "3", "TEST").unwrap();
        assert!(!loader.config.resources.warn_on_leak);
        assert_eq!(loader.config.resources.leak_report_limit, 3);
    }

    #[test]
    fn test_apply_env_var_telemetry() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__TELEMETRY__SERVICE_NAME", "ingest", "TEST").unwrap();
        loader.apply_env_var("TEST__TELEMETRY__LOGGING__LEVEL", "debug", "TEST").unwrap();
        loader.apply_env_var("TEST__TELEMETRY__LOGGING__FORMAT", "pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__TELEMETRY__METRICS__ENABLED", "no", "TEST").unwrap();
        assert_eq!(loader.config.telemetry.service_name, "ingest");
        assert_eq!(loader.config.telemetry.logging.level, "debug");
        assert_eq!(loader.config.telemetry.logging.format, LogFormat::Pretty);
        assert!(!loader.config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__STREAM__MAX_SIZE", "-1", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__STREAM__INFINITE", "sometimes", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__TELEMETRY__LOGGING__FORMAT", "xml", "TEST").is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__DATABASE__URL", "postgres://", "TEST").unwrap();
        assert_eq!(loader.config, AletheiaConfig::default());
    }

    #[test]
    fn test_complete_toml_config() {
        let toml = r#"
            [stream]
            infinite = true
            max_size = 10000
            known_non_empty = true

            [resources]
            warn_on_leak = true
            track_type_names = false
            leak_report_limit = 50

            [telemetry]
            service_name = "ingest"
            report_leaks_on_shutdown = false

            [telemetry.logging]
            enabled = true
            level = "aletheia_core=debug,info"
            format = "json"
            ansi_enabled = false
            include_location = true

            [telemetry.metrics]
            enabled = false
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert!(config.stream.infinite);
        assert_eq!(config.stream.max_size, 10000);
        assert!(config.stream.known_non_empty);
        assert!(!config.resources.track_type_names);
        assert_eq!(config.resources.leak_report_limit, 50);
        assert!(!config.telemetry.report_leaks_on_shutdown);
        assert!(config.telemetry.logging.include_location);
        assert!(!config.telemetry.metrics.enabled);
    }
}
