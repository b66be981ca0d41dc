use super::{types::Config, ConfigError};

/// Shortest monitoring interval accepted.
const MIN_MONITOR_INTERVAL_SECS: u64 = 10;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - qBittorrent credentials are present
/// - Monitor interval is at least 10 seconds
/// - Default size window is not inverted
/// - At least one source is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let client = &config.torrent_client;
    if client.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "torrent_client.url is required".to_string(),
        ));
    }
    if client.username.is_empty() || client.password.is_empty() {
        return Err(ConfigError::ValidationError(
            "qBittorrent credentials are required".to_string(),
        ));
    }

    if config.monitor.interval_secs < MIN_MONITOR_INTERVAL_SECS {
        return Err(ConfigError::ValidationError(format!(
            "monitor.interval_secs should be at least {} seconds",
            MIN_MONITOR_INTERVAL_SECS
        )));
    }

    let filters = &config.filters;
    if filters.default_min_size_gb < 0.0 || filters.default_min_size_gb > filters.default_max_size_gb {
        return Err(ConfigError::ValidationError(format!(
            "invalid default size window [{}, {}]",
            filters.default_min_size_gb, filters.default_max_size_gb
        )));
    }

    if !config.sources.leetx.enabled && !config.sources.watchsomuch.enabled {
        return Err(ConfigError::ValidationError(
            "at least one source must be enabled".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[torrent_client]
url = "http://localhost:8080"
username = "admin"
password = "adminadmin"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_missing_password_fails() {
        let mut config = base_config();
        config.torrent_client.password.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_short_interval_fails() {
        let mut config = base_config();
        config.monitor.interval_secs = 5;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("at least 10 seconds"));
    }

    #[test]
    fn test_validate_inverted_size_window_fails() {
        let mut config = base_config();
        config.filters.default_min_size_gb = 20.0;
        config.filters.default_max_size_gb = 10.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_no_sources_fails() {
        let mut config = base_config();
        config.sources.leetx.enabled = false;
        config.sources.watchsomuch.enabled = false;
        assert!(validate_config(&config).is_err());
    }
}
