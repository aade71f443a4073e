use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://bioguardian-api.satyamthakur.com/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the species API; categories are appended as a path segment
  #[serde(default = "default_api_url")]
  pub url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Database file (defaults to the platform data directory)
  pub path: Option<PathBuf>,
  /// Days before a cached category is considered stale
  #[serde(default = "default_freshness_days")]
  pub freshness_days: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: None,
      freshness_days: default_freshness_days(),
    }
  }
}

impl CacheConfig {
  /// Saturates instead of overflowing; `Config::load` rejects such values.
  pub fn freshness_window(&self) -> Duration {
    Duration::try_days(self.freshness_days).unwrap_or(Duration::MAX)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// tracing filter directive, e.g. "info" or "bioguardian=debug"
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Write a daily rolling log file into this directory
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
    }
  }
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  60
}

fn default_freshness_days() -> i64 {
  7
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./bioguardian.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/bioguardian/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found. The
  /// BIOGUARDIAN_API_URL environment variable overrides `api.url`.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("BIOGUARDIAN_API_URL") {
      config.api.url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("bioguardian.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("bioguardian").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file deserializes to null, which means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  fn validate(&self) -> Result<()> {
    if self.cache.freshness_days <= 0 {
      return Err(eyre!(
        "cache.freshness_days must be positive, got {}",
        self.cache.freshness_days
      ));
    }
    if Duration::try_days(self.cache.freshness_days).is_none() {
      return Err(eyre!(
        "cache.freshness_days is out of range, got {}",
        self.cache.freshness_days
      ));
    }
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be positive"));
    }
    Ok(())
  }
}
