use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, HistorySettings, LeaderboardSettings, LoggingSettings, ServerSettings, StatsSourceSettings,
    StorageSettings,
};
pub use telemetry::init_tracing;

/// Loads the application configuration from `config.toml` in the working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads the configuration from `path`, layering `SIGNALDESK__SECTION__KEY` environment
/// variables on top. A missing file is not an error; every setting has a default.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("SIGNALDESK")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.leaderboard.limit == 0 {
        return Err(ConfigError::ValidationError("leaderboard.limit must be at least 1".to_string()));
    }
    if config.history.limit == 0 {
        return Err(ConfigError::ValidationError("history.limit must be at least 1".to_string()));
    }
    if config.storage.primary_path == config.storage.fallback_path {
        return Err(ConfigError::ValidationError(
            "storage.primary_path and storage.fallback_path must differ".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.leaderboard.limit, 100);
        assert_eq!(config.history.limit, 20);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[storage]
primary_path = "/srv/app/participants.json"
fallback_path = "/tmp/app/participants.json"

[stats_source]
base_url = "http://localhost:9000/stats"
timeout_secs = 15
"#
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.stats_source.base_url, "http://localhost:9000/stats");
        assert_eq!(config.stats_source.timeout_secs, Some(15));
        assert_eq!(config.leaderboard.limit, 100);
    }

    #[test]
    fn rejects_a_zero_leaderboard_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[leaderboard]\nlimit = 0\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::ValidationError(_))));
    }
}
