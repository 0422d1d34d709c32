use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub hn: HnConfig,
}

/// Upstream endpoints, concurrency limit and cache TTLs.
///
/// Every field has a working default, so the tool runs without a config
/// file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HnConfig {
  pub best_stories_url: String,
  /// Item-details URL with an `{id}` placeholder
  pub item_url_template: String,
  /// Maximum simultaneously in-flight detail fetches
  pub max_concurrent_requests: usize,
  pub story_ids_cache_secs: u64,
  pub story_details_cache_secs: u64,
  pub full_result_cache_secs: u64,
  pub request_timeout_secs: u64,
}

impl Default for HnConfig {
  fn default() -> Self {
    Self {
      best_stories_url: "https://hacker-news.firebaseio.com/v0/beststories.json".to_string(),
      item_url_template: "https://hacker-news.firebaseio.com/v0/item/{id}.json".to_string(),
      max_concurrent_requests: 5,
      story_ids_cache_secs: 5 * 60,
      story_details_cache_secs: 60 * 60,
      full_result_cache_secs: 2 * 60,
      request_timeout_secs: 10,
    }
  }
}

impl HnConfig {
  /// Item-details URL for one story.
  pub fn item_url(&self, id: u64) -> String {
    self.item_url_template.replace("{id}", &id.to_string())
  }

  pub fn story_ids_ttl(&self) -> Duration {
    Duration::from_secs(self.story_ids_cache_secs)
  }

  pub fn story_details_ttl(&self) -> Duration {
    Duration::from_secs(self.story_details_cache_secs)
  }

  pub fn full_result_ttl(&self) -> Duration {
    Duration::from_secs(self.full_result_cache_secs)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  fn validate(&self) -> Result<()> {
    if self.max_concurrent_requests == 0 {
      return Err(eyre!("max_concurrent_requests must be at least 1"));
    }
    if self.story_ids_cache_secs == 0
      || self.story_details_cache_secs == 0
      || self.full_result_cache_secs == 0
    {
      return Err(eyre!("cache TTLs must be positive"));
    }
    if self.request_timeout_secs == 0 {
      return Err(eyre!("request_timeout_secs must be positive"));
    }
    if !self.item_url_template.contains("{id}") {
      return Err(eyre!(
        "item_url_template must contain an {{id}} placeholder: {}",
        self.item_url_template
      ));
    }

    Url::parse(&self.best_stories_url)
      .map_err(|e| eyre!("Invalid best_stories_url {}: {}", self.best_stories_url, e))?;
    Url::parse(&self.item_url(0))
      .map_err(|e| eyre!("Invalid item_url_template {}: {}", self.item_url_template, e))?;

    Ok(())
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./hnbest.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/hnbest/config.yaml
  ///
  /// With no file found the built-in defaults are used.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config.hn.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("hnbest.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("hnbest").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}
