use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Defaults read from a JSON file; command-line flags take precedence.
///
/// ```json
/// { "server": "https://tracker.moodle.org", "block_size": 500 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: Option<String>,
    pub username: Option<String>,
    pub api_version: Option<String>,
    pub block_size: Option<u32>,
    pub max_retries: Option<u32>,
    /// Replaces the default issue columns to anonymize.
    pub anonymize_fields: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// `<config_dir>/jira-extractor/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            Error::ConfigurationMissing("could not determine the user config directory".to_string())
        })?;
        Ok(dir.join("jira-extractor").join("config.json"))
    }

    /// Loads the file at `path`. A missing or blank file yields `None`.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        if !fs::try_exists(path).await? {
            debug!(path = %path.display(), "no config file");
            return Ok(None);
        }

        let contents = fs::read_to_string(path).await?;
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let config = serde_json::from_str(&contents).map_err(|e| {
            Error::InvalidConfiguration(format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "config file loaded");
        Ok(Some(config))
    }

    /// Loads `path` when given, otherwise the default location; absent files give the defaults.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        Ok(Self::load(&path).await?.unwrap_or_default())
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let mut file = fs::File::create(path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        // Given
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            server: Some("https://tracker.moodle.org".to_string()),
            block_size: Some(250),
            anonymize_fields: Some(vec!["assignee.key".to_string()]),
            ..Default::default()
        };

        // When
        config.save(&path).await.unwrap();
        let loaded = AppConfig::load(&path).await.unwrap();

        // Then
        assert_eq!(loaded, Some(config));
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();

        let loaded = AppConfig::load(&dir.path().join("absent.json")).await.unwrap();

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_retries": 5}"#).unwrap();

        let loaded = AppConfig::load_or_default(Some(&path)).await.unwrap();

        assert_eq!(loaded.max_retries, Some(5));
        assert!(loaded.server.is_none());
    }

    #[tokio::test]
    async fn test_blank_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "  \n").unwrap();

        assert!(AppConfig::load(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ server: ").unwrap();

        let result = AppConfig::load(&path).await;

        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_default_path() {
        if let Ok(path) = AppConfig::default_path() {
            assert!(path.ends_with("jira-extractor/config.json"));
        }
    }
}
