use super::{types::Config, ConfigError};

/// Validate a loaded configuration before the server starts.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.host.trim().is_empty() {
        return Err(ConfigError::Invalid("server.host must not be empty".into()));
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid("server.port must not be 0".into()));
    }

    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "database.path must not be empty".into(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::Invalid(
            "database.max_connections must be at least 1".into(),
        ));
    }

    if config.torrent.data_dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(
            "torrent.data_dir must not be empty".into(),
        ));
    }

    if config.torrent.metadata_timeout == 0 {
        return Err(ConfigError::Invalid(
            "torrent.metadata_timeout must be at least 1 second".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_empty_host_rejected() {
        let mut config = Config::default();
        config.server.host = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_db_path_rejected() {
        let mut config = Config::default();
        config.database.path = "".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let mut config = Config::default();
        config.torrent.data_dir = "".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_metadata_timeout_rejected() {
        let mut config = Config::default();
        config.torrent.metadata_timeout = 0;
        assert!(validate_config(&config).is_err());
    }
}
