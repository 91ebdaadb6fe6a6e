use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::classify::CategoryTable;
use crate::{Error, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Everything a harvest run needs. Passed explicitly into providers, the harvester
/// and the pipeline; there is no process-wide copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search topics, queried in order.
    pub topics: Vec<String>,
    /// Source domains results are accepted from.
    pub allow_list: Vec<String>,
    pub categories: CategoryTable,
    /// Cap on candidates consumed per run, across all topics.
    pub max_articles: usize,
    /// Results requested from the provider for a single topic.
    pub results_per_query: usize,
    pub request_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topics: [
                "AI news today",
                "artificial intelligence latest news",
                "AI breakthrough",
                "machine learning news",
                "ChatGPT OpenAI news",
                "AI technology updates",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            allow_list: ["techcrunch.com", "venturebeat.com", "theverge.com", "arstechnica.com", "wired.com"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            categories: CategoryTable::default(),
            max_articles: 10,
            results_per_query: 5,
            request_delay_secs: 2,
            request_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Loads a JSON config file. Missing fields fall back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        tracing::debug!("Loaded config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.allow_list.iter().all(|d| d.trim().is_empty()) {
            return Err(Error::Configuration("allow-list is empty".to_string()));
        }
        if self.results_per_query == 0 {
            return Err(Error::Configuration("results_per_query must be at least 1".to_string()));
        }
        self.categories.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_delay(), Duration::from_secs(2));
        assert_eq!(config.max_articles, 10);
        assert_eq!(config.allow_list.len(), 5);
    }

    #[test]
    fn test_empty_allow_list_is_rejected() {
        let config = Config {
            allow_list: vec![" ".to_string()],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"allow_list": ["example.com"], "request_delay_secs": 0}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.allow_list, vec!["example.com".to_string()]);
        assert_eq!(config.request_delay(), Duration::ZERO);
        assert_eq!(config.categories, CategoryTable::default());
        assert_eq!(config.results_per_query, 5);
    }

    #[test]
    fn test_from_file_missing_is_configuration_error() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
