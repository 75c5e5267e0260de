use crate::query::StoreOptions;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
  pub backend: BackendConfig,
  /// Prefilled on the login form, and used for auto-login together with
  /// CAREERDASH_PASSWORD
  pub username: Option<String>,
  pub cache: CacheConfig,
  pub log: LogConfig,
  /// UI tick interval in milliseconds
  pub tick_ms: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      backend: BackendConfig::default(),
      username: None,
      cache: CacheConfig::default(),
      log: LogConfig::default(),
      tick_ms: 250,
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
  pub url: String,
  /// Per-request timeout
  pub timeout_secs: u64,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:5000".to_string(),
      timeout_secs: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
  /// Age after which successful data is refetched
  pub stale_secs: u64,
  /// How long unused entries are kept
  pub gc_grace_secs: u64,
  /// Keep last successful payloads in sqlite across restarts
  pub persist: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: 300,
      gc_grace_secs: 60,
      persist: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
  /// Filter directive used when RUST_LOG is unset
  pub level: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./careerdash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/careerdash/config.yaml
  ///
  /// Every field has a default, so running without a file is fine.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("careerdash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("careerdash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is valid and means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      stale_time: Duration::from_secs(self.cache.stale_secs),
      gc_grace: Duration::from_secs(self.cache.gc_grace_secs),
      fetch_timeout: Some(Duration::from_secs(self.backend.timeout_secs)),
    }
  }

  pub fn tick_rate(&self) -> Duration {
    Duration::from_millis(self.tick_ms.max(16))
  }

  /// Get the auto-login password from CAREERDASH_PASSWORD, if set.
  pub fn get_password() -> Option<String> {
    std::env::var("CAREERDASH_PASSWORD")
      .ok()
      .filter(|p| !p.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_is_default() {
    assert_eq!(Config::parse("").unwrap(), Config::default());
  }

  #[test]
  fn test_partial_config_fills_defaults() {
    let config = Config::parse(
      r#"
backend:
  url: https://careers.example.com
username: priya
cache:
  persist: false
"#,
    )
    .unwrap();
    assert_eq!(config.backend.url, "https://careers.example.com");
    assert_eq!(config.backend.timeout_secs, 15);
    assert_eq!(config.username.as_deref(), Some("priya"));
    assert!(!config.cache.persist);
    assert_eq!(config.cache.stale_secs, 300);
    assert_eq!(config.tick_ms, 250);
  }

  #[test]
  fn test_store_options() {
    let config = Config::parse("cache:\n  stale_secs: 10\n  gc_grace_secs: 5\n").unwrap();
    let options = config.store_options();
    assert_eq!(options.stale_time, Duration::from_secs(10));
    assert_eq!(options.gc_grace, Duration::from_secs(5));
    assert_eq!(options.fetch_timeout, Some(Duration::from_secs(15)));
  }

  #[test]
  fn test_invalid_yaml_is_error() {
    assert!(Config::parse("backend: [not, a, map]").is_err());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let err = Config::load(Some(Path::new("/nonexistent/careerdash.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
