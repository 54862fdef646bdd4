use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variables recognized by the loader, mapped onto config paths.
fn env_provider() -> Env {
    Env::raw().map(|key| match key.as_str().to_ascii_uppercase().as_str() {
        "SERVER_HOST" => "server.host".into(),
        "SERVER_PORT" => "server.port".into(),
        "ENV" => "server.env".into(),
        "CORS_ALLOW_ORIGIN" => "server.cors_allow_origin".into(),
        "DB_PATH" => "database.path".into(),
        "DB_MAX_CONNECTIONS" => "database.max_connections".into(),
        "DB_CONN_MAX_LIFETIME" => "database.conn_max_lifetime".into(),
        "TORRENT_DATA_DIR" => "torrent.data_dir".into(),
        "TORRENT_MAX_CONNECTIONS" => "torrent.max_connections".into(),
        "TORRENT_ENABLE_DHT" => "torrent.enable_dht".into(),
        "TORRENT_ENABLE_PEX" => "torrent.enable_pex".into(),
        "TORRENT_SEED_ENABLED" => "torrent.seed_enabled".into(),
        "TORRENT_METADATA_TIMEOUT" => "torrent.metadata_timeout".into(),
        "TMDB_API_KEY" => "api.tmdb_api_key".into(),
        // Anything else keeps its own name; unknown keys are ignored
        // by extraction.
        _ => key.as_str().to_owned().into(),
    })
}

/// Load configuration from defaults, an optional TOML file, and environment
/// variable overrides (highest precedence).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider().split("."))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}

/// Load configuration from a TOML string (useful for testing).
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}
