use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Lowest accepted fetch interval
pub const MIN_FETCH_INTERVAL_SECS: u64 = 30;
/// Highest accepted fetch interval (one week)
pub const MAX_FETCH_INTERVAL_SECS: u64 = 7 * 86_400;
/// Lowest accepted cleanup interval
pub const MIN_CLEANUP_INTERVAL_HOURS: u64 = 1;
/// Highest accepted cleanup interval (one year)
pub const MAX_CLEANUP_INTERVAL_HOURS: u64 = 366 * 24;
/// Highest accepted delay before the first sweep (one day)
pub const MAX_CLEANUP_START_DELAY_SECS: u64 = 86_400;
/// Highest accepted retention window (100 years)
pub const MAX_RETENTION_DAYS: u32 = 36_500;

const ENV_PREFIX: &str = "FEEDQ_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. "sqlite:/var/lib/feedq/feedq.db".
    /// Defaults to a file inside the data directory.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Basic auth user
    #[serde(default)]
    pub username: String,
    /// Basic auth password
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub cors_allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            username: String::new(),
            password: String::new(),
            cors_allow_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Feed URLs fetched on every cycle
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Fetch interval in seconds (>= 30)
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_secs: u64,
    /// Retention sweep interval in hours (>= 1)
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_hours: u64,
    /// Delay before the first retention sweep
    #[serde(default = "default_cleanup_start_delay")]
    pub cleanup_start_delay_secs: u64,
    /// Unsaved entries not seen in a fetch for this many days are deleted
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            fetch_interval_secs: default_fetch_interval(),
            cleanup_interval_hours: default_cleanup_interval(),
            cleanup_start_delay_secs: default_cleanup_start_delay(),
            retention_days: default_retention_days(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl SyncConfig {
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours.saturating_mul(3600))
    }

    pub fn cleanup_start_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_start_delay_secs)
    }

    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedq")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_fetch_interval() -> u64 {
    300 // 5 minutes
}

fn default_cleanup_interval() -> u64 {
    24
}

fn default_cleanup_start_delay() -> u64 {
    30
}

fn default_retention_days() -> u32 {
    7
}

fn default_timeout() -> u64 {
    30
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Split a comma separated env value, dropping blanks
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{}{} has an invalid value: '{}'", ENV_PREFIX, key, value)))
}

impl AppConfig {
    /// Load configuration from the given file (or the default location), then
    /// apply environment overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            tracing::info!("Config file not found at {}, using defaults", config_path.display());
            Self::default()
        };

        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `FEEDQ_*` overrides from an iterator of environment variables
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(key) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match key {
                "DATABASE_URL" => self.database.url = Some(value),
                "PORT" => self.server.port = parse_env(key, &value)?,
                "USERNAME" => self.server.username = value,
                "PASSWORD" => self.server.password = value,
                "CORS_ALLOW_ORIGINS" => self.server.cors_allow_origins = split_list(&value),
                "FEEDS" => self.sync.feeds = split_list(&value),
                "FETCH_INTERVAL_SECS" => self.sync.fetch_interval_secs = parse_env(key, &value)?,
                "CLEANUP_INTERVAL_HOURS" => {
                    self.sync.cleanup_interval_hours = parse_env(key, &value)?
                }
                "RETENTION_DAYS" => self.sync.retention_days = parse_env(key, &value)?,
                "LOG_LEVEL" => self.general.log_level = value,
                _ => {}
            }
        }
        Ok(())
    }

    /// Check the scheduling settings every command depends on
    pub fn validate(&self) -> Result<()> {
        if self.sync.fetch_interval_secs < MIN_FETCH_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "fetch_interval_secs must be at least {}, got {}",
                MIN_FETCH_INTERVAL_SECS, self.sync.fetch_interval_secs
            )));
        }

        if self.sync.cleanup_interval_hours < MIN_CLEANUP_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "cleanup_interval_hours must be at least {}, got {}",
                MIN_CLEANUP_INTERVAL_HOURS, self.sync.cleanup_interval_hours
            )));
        }

        if self.sync.fetch_interval_secs > MAX_FETCH_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "fetch_interval_secs must be at most {}, got {}",
                MAX_FETCH_INTERVAL_SECS, self.sync.fetch_interval_secs
            )));
        }

        if self.sync.cleanup_interval_hours > MAX_CLEANUP_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "cleanup_interval_hours must be at most {}, got {}",
                MAX_CLEANUP_INTERVAL_HOURS, self.sync.cleanup_interval_hours
            )));
        }

        if self.sync.cleanup_start_delay_secs > MAX_CLEANUP_START_DELAY_SECS {
            return Err(Error::Config(format!(
                "cleanup_start_delay_secs must be at most {}, got {}",
                MAX_CLEANUP_START_DELAY_SECS, self.sync.cleanup_start_delay_secs
            )));
        }

        if self.sync.retention_days > MAX_RETENTION_DAYS {
            return Err(Error::Config(format!(
                "retention_days must be at most {}, got {}",
                MAX_RETENTION_DAYS, self.sync.retention_days
            )));
        }

        let retention_secs = i64::from(self.sync.retention_days) * 86_400;
        if retention_secs <= self.sync.fetch_interval_secs as i64 {
            return Err(Error::Config(format!(
                "retention_days ({}) must cover more than one fetch interval ({}s)",
                self.sync.retention_days, self.sync.fetch_interval_secs
            )));
        }

        for feed in &self.sync.feeds {
            url::Url::parse(feed)
                .map_err(|e| Error::Config(format!("Invalid feed URL '{}': {}", feed, e)))?;
        }

        Ok(())
    }

    /// Stricter checks for the `serve` command: credentials and at least one feed
    pub fn validate_for_serve(&self) -> Result<()> {
        self.validate()?;

        if self.server.username.is_empty() || self.server.password.is_empty() {
            return Err(Error::Config(
                "server.username and server.password are required".to_string(),
            ));
        }

        if self.sync.feeds.is_empty() {
            return Err(Error::Config("sync.feeds must list at least one feed".to_string()));
        }

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/feedq/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feedq")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Connection string for the entry store
    pub fn database_url(&self) -> String {
        match &self.database.url {
            Some(url) => url.clone(),
            None => format!("sqlite:{}", self.data_dir().join("feedq.db").display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.cleanup_start_delay_secs, 30);
    }

    #[test]
    fn test_parse_toml() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 8080
            username = "admin"
            password = "hunter2"

            [sync]
            feeds = ["https://example.com/feed.xml"]
            fetch_interval_secs = 60
            retention_days = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sync.fetch_interval_secs, 60);
        assert_eq!(config.sync.cleanup_interval_hours, 24);
        assert!(config.validate_for_serve().is_ok());
    }

    #[test]
    fn test_fetch_interval_minimum() {
        let mut config = AppConfig::default();
        config.sync.fetch_interval_secs = 29;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.sync.fetch_interval_secs = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cleanup_interval_minimum() {
        let mut config = AppConfig::default();
        config.sync.cleanup_interval_hours = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_upper_bounds() {
        let mut config = AppConfig::default();
        config.sync.retention_days = u32::MAX;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.sync.retention_days = MAX_RETENTION_DAYS;
        assert!(config.validate().is_ok());

        config.sync.cleanup_interval_hours = u64::MAX / 1000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.sync.cleanup_interval_hours = MAX_CLEANUP_INTERVAL_HOURS;
        assert!(config.validate().is_ok());

        config.sync.fetch_interval_secs = MAX_FETCH_INTERVAL_SECS + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        config.sync.fetch_interval_secs = 300;

        config.sync.cleanup_start_delay_secs = MAX_CLEANUP_START_DELAY_SECS + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_huge_cleanup_interval_saturates() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("FEEDQ_CLEANUP_INTERVAL_HOURS", "18446744073709551")]))
            .unwrap();
        assert_eq!(config.sync.cleanup_interval(), Duration::from_secs(u64::MAX));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_retention_must_exceed_fetch_interval() {
        let mut config = AppConfig::default();
        config.sync.retention_days = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_serve_requires_credentials_and_feeds() {
        let mut config = AppConfig::default();
        config.sync.feeds = vec!["https://example.com/feed.xml".to_string()];
        assert!(config.validate_for_serve().is_err());

        config.server.username = "u".to_string();
        config.server.password = "p".to_string();
        assert!(config.validate_for_serve().is_ok());

        config.sync.feeds.clear();
        assert!(config.validate_for_serve().is_err());
    }

    #[test]
    fn test_invalid_feed_url_rejected() {
        let mut config = AppConfig::default();
        config.sync.feeds = vec!["not a url".to_string()];
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("FEEDQ_PORT", "9000"),
                ("FEEDQ_FEEDS", "https://a.example/feed, https://b.example/feed,"),
                ("FEEDQ_DATABASE_URL", "sqlite::memory:"),
                ("FEEDQ_FETCH_INTERVAL_SECS", "45"),
                ("HOME", "/ignored"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.sync.feeds.len(), 2);
        assert_eq!(config.sync.feeds[1], "https://b.example/feed");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.sync.fetch_interval_secs, 45);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[("FEEDQ_PORT", "eighty")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_database_url_uses_data_dir() {
        let mut config = AppConfig::default();
        config.general.data_dir = PathBuf::from("/tmp/feedq-test");
        assert_eq!(config.database_url(), "sqlite:/tmp/feedq-test/feedq.db");
    }
}
