//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (every section is `#[serde(default)]`)
//! 2. Optional config file (`RESTOCK_CONFIG`, default `config/default`)
//! 3. Environment variables, e.g. `RESTOCK_SCHEDULE__CHECK_INTERVAL_SECONDS=60`
//!
//! The legacy `DISCORD_WEBHOOK_URL` variable fills in the webhook URL when
//! nothing else configured one.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::ProductReference;
use crate::domain::constants::{notify, polling};
use crate::infrastructure::http_client::HttpClientConfig;
use crate::infrastructure::notifier::NotifierConfig;
use crate::infrastructure::parsing::ExtractionConfig;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "RESTOCK_CONFIG";

/// Config file used when `RESTOCK_CONFIG` is unset (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "RESTOCK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Monitored products; names must be unique
    pub products: Vec<ProductReference>,
    pub fetch: HttpClientConfig,
    pub schedule: ScheduleConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
    pub extraction: ExtractionConfig,
}

/// Polling cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause between full check cycles
    pub check_interval_seconds: u64,

    /// Politeness delay between two product checks
    pub product_delay_ms: u64,

    /// Random extra delay added to each politeness delay
    pub product_delay_jitter_ms: u64,

    /// Products checked concurrently within one cycle
    pub max_concurrent_checks: usize,

    /// Run a single cycle and exit
    pub run_once: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: polling::CHECK_INTERVAL_SECONDS,
            product_delay_ms: polling::PRODUCT_DELAY_MS,
            product_delay_jitter_ms: polling::PRODUCT_DELAY_JITTER_MS,
            max_concurrent_checks: 1,
            run_once: false,
        }
    }
}

impl ScheduleConfig {
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    /// Politeness delay with a fresh jitter sample
    #[must_use]
    pub fn product_delay(&self) -> Duration {
        let jitter = if self.product_delay_jitter_ms > 0 {
            fastrand::u64(0..=self.product_delay_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.product_delay_ms.saturating_add(jitter))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for rolling log files
    pub log_dir: String,

    /// File name prefix; a date suffix is appended daily
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: "logs".to_string(),
            file_name: "restock-monitor.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the file named by `RESTOCK_CONFIG` plus the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&path)
    }

    /// Load from `path` (missing file allowed) plus the process environment
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::from_sources(
            path,
            Self::environment(),
            std::env::var(notify::LEGACY_WEBHOOK_ENV).ok(),
        )
    }

    /// Load from explicit sources
    pub fn from_sources(
        path: &str,
        environment: config::Environment,
        legacy_webhook_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(environment)
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        config.apply_legacy_webhook(legacy_webhook_url);
        config.validate()?;

        info!(
            "Loaded configuration from '{}' with {} product(s)",
            path,
            config.products.len()
        );
        Ok(config)
    }

    /// `RESTOCK_SECTION__FIELD` style overrides
    #[must_use]
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    fn apply_legacy_webhook(&mut self, legacy_webhook_url: Option<String>) {
        let configured = self
            .notifier
            .webhook_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if !configured {
            self.notifier.webhook_url = legacy_webhook_url.filter(|url| !url.trim().is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(validation("product names must not be empty"));
            }
            if product.url.trim().is_empty() {
                return Err(validation(format!(
                    "product '{}' has an empty url",
                    product.name
                )));
            }
            if !names.insert(product.name.as_str()) {
                return Err(validation(format!(
                    "duplicate product name '{}'",
                    product.name
                )));
            }
        }

        if self.fetch.timeout_seconds == 0 {
            return Err(validation("fetch.timeout_seconds must be greater than 0"));
        }
        if self.fetch.max_requests_per_minute == 0 {
            return Err(validation(
                "fetch.max_requests_per_minute must be greater than 0",
            ));
        }
        if self.schedule.check_interval_seconds == 0 {
            return Err(validation(
                "schedule.check_interval_seconds must be greater than 0",
            ));
        }
        if self.schedule.max_concurrent_checks == 0 {
            return Err(validation(
                "schedule.max_concurrent_checks must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env() -> config::Environment {
        AppConfig::environment().source(Some(config::Map::new()))
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::environment().source(Some(map))
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const PRODUCTS: &str = r#"
        [[products]]
        name = "Booster Bundle"
        url = "https://www.target.com/p/-/A-88897904?preselect=88897904"

        [[products]]
        name = "Lego Set"
        url = "https://www.target.com/p/-/A-93104070#lnk=sametab"
    "#;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::from_sources("/nonexistent/restock", no_env(), None).unwrap();
        assert!(config.products.is_empty());
        assert_eq!(config.schedule.check_interval_seconds, 300);
        assert_eq!(config.schedule.product_delay_ms, 2000);
        assert_eq!(config.fetch.timeout_seconds, 15);
        assert_eq!(config.schedule.max_concurrent_checks, 1);
        assert!(config.notifier.webhook_url.is_none());
    }

    #[test]
    fn loads_products_and_sections_from_file() {
        let file = toml_file(&format!(
            "{PRODUCTS}\n[schedule]\ncheck_interval_seconds = 60\nrun_once = true\n"
        ));
        let config =
            AppConfig::from_sources(file.path().to_str().unwrap(), no_env(), None).unwrap();

        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].name, "Booster Bundle");
        assert_eq!(config.schedule.check_interval_seconds, 60);
        assert!(config.schedule.run_once);
        assert_eq!(config.schedule.product_delay_ms, 2000);
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file("[schedule]\ncheck_interval_seconds = 60\n");
        let config = AppConfig::from_sources(
            file.path().to_str().unwrap(),
            env(&[("RESTOCK_SCHEDULE__CHECK_INTERVAL_SECONDS", "30")]),
            None,
        )
        .unwrap();
        assert_eq!(config.schedule.check_interval_seconds, 30);
    }

    #[test]
    fn legacy_webhook_fills_missing_url_only() {
        let config = AppConfig::from_sources(
            "/nonexistent/restock",
            no_env(),
            Some("https://discord.example/hook".to_string()),
        )
        .unwrap();
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://discord.example/hook")
        );

        let file = toml_file("[notifier]\nwebhook_url = \"https://configured.example/hook\"\n");
        let config = AppConfig::from_sources(
            file.path().to_str().unwrap(),
            no_env(),
            Some("https://discord.example/hook".to_string()),
        )
        .unwrap();
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://configured.example/hook")
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let file = toml_file(
            r#"
            [[products]]
            name = "Same"
            url = "https://www.target.com/p/-/A-1"
            [[products]]
            name = "Same"
            url = "https://www.target.com/p/-/A-2"
            "#,
        );
        let err = AppConfig::from_sources(file.path().to_str().unwrap(), no_env(), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.schedule.max_concurrent_checks = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.fetch.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.schedule.check_interval_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.products.push(ProductReference::new("  ", "https://x/A-1"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn product_delay_stays_within_jitter_window() {
        let schedule = ScheduleConfig {
            product_delay_ms: 100,
            product_delay_jitter_ms: 50,
            ..ScheduleConfig::default()
        };
        for _ in 0..20 {
            let delay = schedule.product_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(150));
        }
    }
}
