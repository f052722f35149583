//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the ledger
//! client configuration from a YAML file.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

use super::types::LedgerConfig;

/// Loads and validates the client configuration.
///
/// # File Layout
///
/// ```text
/// api:
///   base_url: http://localhost:8080
///   request_timeout_secs: 8
/// cache:
///   employee_ttl_secs: 300
///   record_ttl_secs: 60
/// report:
///   company_name: Sunrise Bakery
///   currency_symbol: "₹"
/// endpoints:
///   attendance_filter: /api/attendance/filter
/// ```
///
/// Every key is optional.
///
/// # Example
///
/// ```no_run
/// use attendance_ledger::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/ledger.yaml").unwrap();
/// println!("Backend: {}", loader.config().api.base_url);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: LedgerConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified file.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing (`ConfigNotFound`)
    /// - The file contains invalid YAML or out-of-range values (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> LedgerResult<Self> {
        let path = path.as_ref();
        let config = Self::load_yaml::<LedgerConfig>(path)?;
        Self::validate(&config, &path.display().to_string())?;
        debug!(path = %path.display(), base_url = %config.api.base_url, "Loaded configuration");
        Ok(Self { config })
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> LedgerResult<Self> {
        let config: LedgerConfig =
            serde_yaml::from_str(content).map_err(|e| LedgerError::ConfigParseError {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;
        Self::validate(&config, "<inline>")?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> LedgerResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| LedgerError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| LedgerError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate(config: &LedgerConfig, path: &str) -> LedgerResult<()> {
        let invalid = |message: String| LedgerError::ConfigParseError {
            path: path.to_string(),
            message,
        };

        if !(1..=60).contains(&config.api.request_timeout_secs) {
            return Err(invalid(format!(
                "api.request_timeout_secs must be between 1 and 60, got {}",
                config.api.request_timeout_secs
            )));
        }
        url::Url::parse(&config.api.base_url)
            .map_err(|e| invalid(format!("api.base_url is not a valid URL: {e}")))?;

        for (key, secs) in [
            ("cache.employee_ttl_secs", config.cache.employee_ttl_secs),
            ("cache.record_ttl_secs", config.cache.record_ttl_secs),
        ] {
            if secs == 0 {
                return Err(invalid(format!("{key} must be at least 1")));
            }
        }

        Ok(())
    }

    /// Replaces the backend base URL, e.g. from a command-line flag.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> LedgerResult<Self> {
        self.config.api.base_url = base_url.into();
        Self::validate(&self.config, "<override>")?;
        Ok(self)
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> LedgerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_document_uses_defaults() {
        let loader = ConfigLoader::from_yaml_str("{}").unwrap();
        let config = loader.config();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(8));
        assert_eq!(config.cache.employee_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.record_ttl(), Duration::from_secs(60));
        assert_eq!(config.report.currency_symbol, "₹");
        assert_eq!(config.endpoints.bulk_mark, "/api/bulk-attendance/mark");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let yaml = r#"
api:
  base_url: https://attendance.example.com
cache:
  record_ttl_secs: 5
endpoints:
  attendance_filter: /v2/attendance/filter
"#;
        let config = ConfigLoader::from_yaml_str(yaml).unwrap().into_config();
        assert_eq!(config.api.base_url, "https://attendance.example.com");
        assert_eq!(config.api.request_timeout_secs, 8);
        assert_eq!(config.cache.record_ttl_secs, 5);
        assert_eq!(config.cache.employee_ttl_secs, 300);
        assert_eq!(config.endpoints.attendance_filter, "/v2/attendance/filter");
        assert_eq!(config.endpoints.attendance_create, "/attendance");
    }

    #[test]
    fn test_timeout_out_of_range_is_rejected() {
        let result = ConfigLoader::from_yaml_str("api:\n  request_timeout_secs: 0\n");
        assert!(matches!(result, Err(LedgerError::ConfigParseError { .. })));

        let result = ConfigLoader::from_yaml_str("api:\n  request_timeout_secs: 61\n");
        assert!(matches!(result, Err(LedgerError::ConfigParseError { .. })));
    }

    #[test]
    fn test_zero_cache_ttl_is_rejected() {
        let result = ConfigLoader::from_yaml_str("cache:\n  record_ttl_secs: 0\n");
        match result {
            Err(LedgerError::ConfigParseError { message, .. }) => {
                assert!(message.contains("cache.record_ttl_secs"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }

        let result = ConfigLoader::from_yaml_str("cache:\n  employee_ttl_secs: 0\n");
        assert!(matches!(result, Err(LedgerError::ConfigParseError { .. })));
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let result = ConfigLoader::from_yaml_str("api:\n  base_url: not a url\n");
        match result {
            Err(LedgerError::ConfigParseError { message, .. }) => {
                assert!(message.contains("base_url"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml_is_a_parse_error() {
        let result = ConfigLoader::from_yaml_str("api: [unclosed");
        assert!(matches!(result, Err(LedgerError::ConfigParseError { .. })));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = ConfigLoader::load("/nonexistent/ledger.yaml");
        match result {
            Err(LedgerError::ConfigNotFound { path }) => {
                assert!(path.contains("ledger.yaml"));
            }
            other => panic!("Expected ConfigNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_base_url_override() {
        let loader = ConfigLoader::default()
            .with_base_url("http://10.0.0.5:9000")
            .unwrap();
        assert_eq!(loader.config().api.base_url, "http://10.0.0.5:9000");
        assert!(ConfigLoader::default().with_base_url("::").is_err());
    }

    #[test]
    fn test_load_bundled_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/ledger.yaml");
        let loader = ConfigLoader::load(path).unwrap();
        assert_eq!(loader.config().api.request_timeout_secs, 8);
    }
}
