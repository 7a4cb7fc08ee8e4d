use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_wal_path")]
    pub wal_path: PathBuf,
    /// Served under /static; profile pictures live in its user_images/
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// JPEG quality used when recompressing uploads (1-100)
    #[serde(default = "default_picture_quality")]
    pub picture_quality: u8,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_user_capacity")]
    pub user_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: i64,
    /// Mark the cookie Secure; enable when served over HTTPS
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wal_path: default_wal_path(),
            static_dir: default_static_dir(),
            picture_quality: default_picture_quality(),
            max_upload_bytes: default_max_upload_bytes(),
            user_capacity: default_user_capacity(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
            cookie_secure: false,
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_wal_path() -> PathBuf {
    PathBuf::from("presence.wal")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_picture_quality() -> u8 {
    30
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

fn default_user_capacity() -> usize {
    256
}

fn default_session_ttl() -> i64 {
    7 * 24 * 3600 // one week
}

fn default_cleanup_interval() -> u64 {
    3600 // 1 hour
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.storage.picture_quality == 0 || self.storage.picture_quality > 100 {
            bail!(
                "picture_quality must be between 1 and 100, got {}",
                self.storage.picture_quality
            );
        }

        if self.storage.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than 0");
        }

        if self.session.ttl_seconds <= 0 {
            bail!("session ttl_seconds must be greater than 0");
        }

        if self.session.cleanup_interval == 0 {
            bail!("session cleanup_interval must be greater than 0");
        }

        // bcrypt accepts 4..=31
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            bail!(
                "bcrypt_cost must be between 4 and 31, got {}",
                self.security.bcrypt_cost
            );
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert!(config.server.num_threads > 0);
        assert_eq!(config.storage.wal_path, PathBuf::from("presence.wal"));
        assert_eq!(config.storage.static_dir, PathBuf::from("static"));
        assert_eq!(config.storage.picture_quality, 30);
        assert_eq!(config.session.ttl_seconds, 604_800);
        assert!(!config.session.cookie_secure);
        assert_eq!(config.security.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 5000
            bind_address = "127.0.0.1"
            num_threads = 2

            [storage]
            wal_path = "/var/lib/presence/users.wal"
            static_dir = "/var/lib/presence/static"
            picture_quality = 60
            max_upload_bytes = 1048576

            [session]
            ttl_seconds = 3600
            cookie_secure = true
            cleanup_interval = 120

            [security]
            bcrypt_cost = 10

            [logging]
            level = "debug"
            format = "console"
            console = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.num_threads, 2);
        assert_eq!(config.storage.picture_quality, 60);
        assert!(config.session.cookie_secure);
        assert_eq!(config.session.cleanup_interval, 120);
        assert_eq!(config.security.bcrypt_cost, 10);
        assert_eq!(config.logging.format, "console");
    }

    #[test]
    fn test_missing_server_section_fails() {
        assert!(Config::from_toml("[logging]\nlevel = \"info\"\n").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml("[server]\nport = 0\n").is_err());
        assert!(Config::from_toml("[server]\nport = 80\n[storage]\npicture_quality = 0\n").is_err());
        assert!(Config::from_toml("[server]\nport = 80\n[storage]\npicture_quality = 101\n").is_err());
        assert!(Config::from_toml("[server]\nport = 80\n[security]\nbcrypt_cost = 3\n").is_err());
        assert!(Config::from_toml("[server]\nport = 80\n[session]\nttl_seconds = 0\n").is_err());
        assert!(Config::from_toml("[server]\nport = 80\n[logging]\nlevel = \"loud\"\n").is_err());
        assert!(Config::from_toml("[server]\nport = 80\n[logging]\nformat = \"xml\"\n").is_err());
    }
}
