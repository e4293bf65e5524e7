use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub backend_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("agentdeck").join("config.json"))
    }

    /// Resolve the backend base address: CLI flag, then environment, then
    /// config file, then the built-in default.
    pub fn resolve_backend_url(&self, cli_url: Option<String>) -> String {
        cli_url
            .or_else(|| std::env::var("AGENTDECK_URL").ok())
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(config.backend_url.is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            backend_url: Some("http://cockpit.local:8080".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url.as_deref(), Some("http://cockpit.local:8080"));
    }

    #[test]
    fn test_cli_url_wins_over_config() {
        let config = Config {
            backend_url: Some("http://from-config".to_string()),
        };
        let url = config.resolve_backend_url(Some("http://from-cli".to_string()));
        assert_eq!(url, "http://from-cli");
    }

    #[test]
    fn test_default_url_when_nothing_configured() {
        std::env::remove_var("AGENTDECK_URL");
        let config = Config::new();
        assert_eq!(config.resolve_backend_url(None), DEFAULT_BACKEND_URL);
    }
}
