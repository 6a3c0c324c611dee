use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::types::AnyResult;
use crate::configs::{LoggingConfig, PlayerConfig};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Load `config.toml`, falling back to `config.default.toml`.
    pub fn load() -> AnyResult<Self> {
        let config_path = if std::path::Path::new("config.toml").exists() {
            "config.toml"
        } else if std::path::Path::new("config.default.toml").exists() {
            "config.default.toml"
        } else {
            return Err("config.toml or config.default.toml not found".into());
        };

        info!("Loading configuration from: {}", config_path);

        let config_str = std::fs::read_to_string(config_path)?;
        if config_str.is_empty() {
            return Err(format!("{} is empty", config_path).into());
        }

        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            [player]
            max_queue_size = 25
            auto_leave = false
            idle_timeout_ms = 60000
            reap_interval_ms = 5000

            [logging]
            level = "debug"
            filters = "rustacall=trace"
            "#,
        )
        .unwrap();

        assert_eq!(config.player.max_queue_size, 25);
        assert!(!config.player.auto_leave);
        assert_eq!(config.player.idle_timeout_ms, 60_000);
        assert_eq!(config.player.reap_interval_ms, 5_000);
        assert_eq!(config.logging.as_ref().unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.player.max_queue_size, 100);
        assert!(config.player.auto_leave);
        assert_eq!(config.player.idle_timeout_ms, 300_000);
        assert!(config.logging.is_none());
    }
}
