use crate::analyzer::filter::{FilterKey, FilterValue};
use crate::analyzer::pricing::DEFAULT_CONSUMPTION_KWH;
use crate::model::Vertical;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataStoreConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Vertical slug → table name, for stores that deviate from the defaults.
    #[serde(default)]
    pub tables: HashMap<Vertical, String>,
}

fn default_timeout() -> u64 {
    10
}

/// One comparison page to evaluate on every pass.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// Page URL, e.g. `/strom?type=fixed&duration=12`.
    pub page: String,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub filters: HashMap<String, FilterValue>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub annual_consumption_kwh: Option<f64>,
}

fn default_limit() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_store: DataStoreConfig,
    pub views: Vec<ViewConfig>,
    pub check_interval_seconds: u64,
    #[serde(default = "default_consumption")]
    pub default_consumption_kwh: f64,
    #[serde(default)]
    pub verify_urls: bool,
}

fn default_consumption() -> f64 {
    DEFAULT_CONSUMPTION_KWH
}

impl AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_store.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("data_store.base_url is empty".into()));
        }
        if !(self.default_consumption_kwh > 0.0) {
            return Err(ConfigError::Invalid(
                "default_consumption_kwh must be positive".into(),
            ));
        }
        for view in &self.views {
            if !view.page.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "view page must be a path: {}",
                    view.page
                )));
            }
            if let Some(key) = view.filters.keys().find(|k| FilterKey::parse(k).is_none()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown filter `{}` in view {}",
                    key, view.page
                )));
            }
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data_store": {
            "base_url": "https://db.example.no",
            "api_key": "anon",
            "tables": { "strom": "power_prices_v2" }
        },
        "views": [
            {
                "page": "/strom?type=fixed&duration=12",
                "municipality": "Oslo",
                "sort": "price_asc"
            },
            { "page": "/mobil", "filters": { "price": { "range": [0, 299] } }, "limit": 3 }
        ],
        "check_interval_seconds": 600
    }"#;

    #[test]
    fn parses_views_and_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.views.len(), 2);
        assert_eq!(config.default_consumption_kwh, 16_000.0);
        assert_eq!(config.data_store.timeout_seconds, 10);
        assert_eq!(
            config.data_store.tables.get(&Vertical::Power).map(String::as_str),
            Some("power_prices_v2")
        );
        assert_eq!(config.views[0].limit, 5);
        assert_eq!(
            config.views[1].filters.get("price"),
            Some(&FilterValue::Range(0.0, 299.0))
        );
    }

    #[test]
    fn rejects_unknown_filter_keys() {
        let broken = SAMPLE.replace("\"price\"", "\"colour\"");
        assert!(matches!(parse_config(&broken), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_relative_pages() {
        let broken = SAMPLE.replace("\"/mobil\"", "\"mobil\"");
        assert!(matches!(parse_config(&broken), Err(ConfigError::Invalid(_))));
    }
}
