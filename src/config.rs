use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub wcl: WclConfig,
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub members: MembersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WclConfig {
  /// Domain hosting the API, e.g. "warcraftlogs.com" (the `www.` prefix is added)
  #[serde(default = "default_primary_domain")]
  pub primary_domain: String,
  /// OAuth client id. The secret is only ever read from the environment.
  pub client_id: Option<String>,
}

impl Default for WclConfig {
  fn default() -> Self {
    Self {
      primary_domain: default_primary_domain(),
      client_id: None,
    }
  }
}

fn default_primary_domain() -> String {
  "warcraftlogs.com".to_string()
}

impl WclConfig {
  fn base_url(&self) -> Result<Url> {
    Url::parse(&format!("https://www.{}/", self.primary_domain))
      .map_err(|e| eyre!("Invalid primary domain '{}': {}", self.primary_domain, e))
  }

  /// OAuth client-credentials endpoint
  pub fn token_url(&self) -> Result<Url> {
    Ok(self.base_url()?.join("oauth/token")?)
  }

  /// GraphQL client endpoint
  pub fn api_url(&self) -> Result<Url> {
    Ok(self.base_url()?.join("api/v2/client")?)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_bind")]
  pub bind: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind: default_bind(),
    }
  }
}

fn default_bind() -> String {
  "127.0.0.1:3000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Cache database path (defaults to the user data directory)
  pub path: Option<PathBuf>,
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
      ttl_secs: default_ttl_secs(),
    }
  }
}

fn default_true() -> bool {
  true
}

fn default_ttl_secs() -> i64 {
  crate::cache::DEFAULT_TTL_SECS
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembersConfig {
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  /// Maximum in-flight page requests; unset fetches every page at once
  pub concurrency: Option<usize>,
  /// Raid difficulty passed to zoneRankings (5 = Mythic)
  #[serde(default = "default_difficulty")]
  pub difficulty: i32,
  /// Ranking partition (-1 = all partitions)
  #[serde(default = "default_partition")]
  pub partition: i32,
}

impl Default for MembersConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
      concurrency: None,
      difficulty: default_difficulty(),
      partition: default_partition(),
    }
  }
}

fn default_page_size() -> u32 {
  100
}

fn default_difficulty() -> i32 {
  5
}

fn default_partition() -> i32 {
  -1
}

/// OAuth client credentials, resolved once at startup.
#[derive(Clone)]
pub struct Credentials {
  pub client_id: String,
  pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("client_id", &self.client_id)
      .field("client_secret", &"<redacted>")
      .finish()
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./wcl-proxy.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/wcl-proxy/config.yaml
  ///
  /// Without a file, built-in defaults are used.
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
      Some(p) => {
        tracing::info!(path = %p.display(), "Loading configuration");
        Self::load_from_path(&p)?
      }
      None => {
        tracing::info!("No configuration file found, using defaults");
        Config::default()
      }
    };

    config.apply_env();
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("wcl-proxy.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("wcl-proxy").join("config.yaml");
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

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  fn apply_env(&mut self) {
    if let Ok(domain) = std::env::var("WCL_PRIMARY_DOMAIN") {
      self.wcl.primary_domain = domain;
    }
    if let Ok(id) = std::env::var("WCL_CLIENT_ID") {
      self.wcl.client_id = Some(id);
    }
  }

  /// Resolve the OAuth credentials.
  ///
  /// The client id comes from config or WCL_CLIENT_ID; the secret only from
  /// WCL_CLIENT_SECRET.
  pub fn credentials(&self) -> Result<Credentials> {
    let client_id = self.wcl.client_id.clone().ok_or_else(|| {
      eyre!("WCL client id not found. Set wcl.client_id or the WCL_CLIENT_ID environment variable.")
    })?;

    let client_secret = std::env::var("WCL_CLIENT_SECRET").map_err(|_| {
      eyre!("WCL client secret not found. Set the WCL_CLIENT_SECRET environment variable.")
    })?;

    Ok(Credentials {
      client_id,
      client_secret,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.wcl.primary_domain, "warcraftlogs.com");
    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert!(config.cache.enabled);
    assert_eq!(config.cache.ttl_secs, 12 * 60 * 60);
    assert_eq!(config.members.page_size, 100);
    assert_eq!(config.members.concurrency, None);
    assert_eq!(config.members.difficulty, 5);
    assert_eq!(config.members.partition, -1);
  }

  #[test]
  fn test_partial_sections() {
    let yaml = r#"
wcl:
  primary_domain: fflogs.com
  client_id: abc
cache:
  enabled: false
members:
  concurrency: 4
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.wcl.primary_domain, "fflogs.com");
    assert_eq!(config.wcl.client_id.as_deref(), Some("abc"));
    assert!(!config.cache.enabled);
    assert_eq!(config.members.concurrency, Some(4));
    assert_eq!(config.members.page_size, 100);
  }

  #[test]
  fn test_endpoint_urls() {
    let wcl = WclConfig::default();
    assert_eq!(
      wcl.token_url().unwrap().as_str(),
      "https://www.warcraftlogs.com/oauth/token"
    );
    assert_eq!(
      wcl.api_url().unwrap().as_str(),
      "https://www.warcraftlogs.com/api/v2/client"
    );
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(Config::load(Some(missing.as_path())).is_err());
  }

  #[test]
  fn test_credentials_debug_hides_secret() {
    let creds = Credentials {
      client_id: "id".to_string(),
      client_secret: "hunter2".to_string(),
    };
    assert!(!format!("{:?}", creds).contains("hunter2"));
  }
}
