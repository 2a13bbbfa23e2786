use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uht_admin::prelude::GatewayConfig;

/// How long a notification stays on screen when the config file doesn't say
pub const DEFAULT_TOAST_SECS: u64 = 5;

/// Optional settings file for the console. Every field may be omitted.
///
/// ```json
/// { "url": "https://admin.example.com/uht", "timeout_secs": 10, "max_retries": 2, "toast_secs": 8 }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub toast_secs: Option<u64>,
}

impl ConsoleConfig {
    /// Reads the config file. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parse {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        let config = serde_json::from_str(data).context("parse console config")?;
        Ok(config)
    }

    /// Gateway settings. A url given on the command line wins over the file.
    pub fn gateway_config(&self, cli_url: Option<&str>) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        if let Some(url) = cli_url.or(self.url.as_deref()) {
            config = config.base_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.request_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = self.max_retries {
            config = config.max_retries(retries);
        }
        config
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_secs.unwrap_or(DEFAULT_TOAST_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_means_defaults() {
        let config = ConsoleConfig::parse("{}").unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.toast_duration(), Duration::from_secs(DEFAULT_TOAST_SECS));
    }

    #[test]
    fn file_values_apply_and_cli_url_wins() {
        let config = ConsoleConfig::parse(
            r#"{"url":"http://file.example/uht","timeout_secs":7,"max_retries":1,"toast_secs":2}"#,
        )
        .unwrap();

        let gateway = config.gateway_config(None);
        assert_eq!(gateway.base_url, "http://file.example/uht");
        assert_eq!(gateway.request_timeout, Duration::from_secs(7));
        assert_eq!(gateway.max_retries, 1);
        assert_eq!(config.toast_duration(), Duration::from_secs(2));

        let gateway = config.gateway_config(Some("http://cli.example/uht/"));
        assert_eq!(gateway.base_url, "http://cli.example/uht");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConsoleConfig::parse(r#"{"uri":"http://typo"}"#).is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let path = std::env::temp_dir().join("uht-console-missing-config.json");
        let config = ConsoleConfig::load(Some(&path)).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }
}
