use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub torrent: TorrentConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub env: Environment,
    /// `Access-Control-Allow-Origin` value. `*` means any origin.
    #[serde(default = "default_cors_origin")]
    pub cors_allow_origin: String,
}

impl ServerConfig {
    /// Bind address in `host:port` form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            env: Environment::default(),
            cors_allow_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Catalog database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Upper bound on concurrent SQLite handles.
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    /// Seconds before a long-lived handle is recycled.
    #[serde(default = "default_db_conn_max_lifetime")]
    pub conn_max_lifetime: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_db_max_connections(),
            conn_max_lifetime: default_db_conn_max_lifetime(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/torrents.db")
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_conn_max_lifetime() -> u64 {
    3600
}

/// Torrent session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentConfig {
    /// Directory where torrent payloads are materialized.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Established-connection cap per torrent.
    #[serde(default = "default_torrent_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub enable_dht: bool,
    #[serde(default = "default_true")]
    pub enable_pex: bool,
    #[serde(default = "default_true")]
    pub seed_enabled: bool,
    /// Seconds to wait for torrent metadata after adding a magnet.
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout: u64,
}

impl TorrentConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout)
    }
}

impl Default for TorrentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_connections: default_torrent_max_connections(),
            enable_dht: true,
            enable_pex: true,
            seed_enabled: true,
            metadata_timeout: default_metadata_timeout(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_torrent_max_connections() -> u32 {
    50
}

fn default_metadata_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ApiConfig {
    /// TMDB API key for movie-details lookups. Lookups fall back to a
    /// filename-derived placeholder when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.env, Environment::Development);
        assert_eq!(config.database.path, PathBuf::from("./data/torrents.db"));
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.conn_max_lifetime, 3600);
        assert_eq!(config.torrent.data_dir, PathBuf::from("./data"));
        assert_eq!(config.torrent.max_connections, 50);
        assert!(config.torrent.enable_dht);
        assert!(config.torrent.enable_pex);
        assert!(config.torrent.seed_enabled);
        assert_eq!(config.torrent.metadata_timeout, 30);
        assert!(config.api.tmdb_api_key.is_none());
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_environment_serialization() {
        assert_eq!(
            serde_json::to_string(&Environment::Development).unwrap(),
            "\"development\""
        );
        assert_eq!(
            serde_json::to_string(&Environment::Production).unwrap(),
            "\"production\""
        );
    }

    #[test]
    fn test_environment_predicates() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Development.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_metadata_timeout_duration() {
        let config = TorrentConfig {
            metadata_timeout: 5,
            ..Default::default()
        };
        assert_eq!(config.metadata_timeout(), Duration::from_secs(5));
    }
}
