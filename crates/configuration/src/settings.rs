use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty (or missing) `config.toml` yields a usable
/// configuration for local development.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub stats_source: StatsSourceSettings,
    pub leaderboard: LeaderboardSettings,
    pub history: HistorySettings,
    pub logging: LoggingSettings,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

/// Locations of the participant document and the snapshot log.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// The preferred participant document. May live on a read-only filesystem.
    pub primary_path: PathBuf,
    /// Used once the primary turns out not to be writable.
    pub fallback_path: PathBuf,
    pub snapshots_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            primary_path: PathBuf::from("data/participants.json"),
            fallback_path: std::env::temp_dir().join("signaldesk").join("participants.json"),
            snapshots_path: PathBuf::from("data/snapshots.json"),
        }
    }
}

/// The third-party performance feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsSourceSettings {
    /// Endpoint queried as `GET {base_url}?username=<name>`.
    pub base_url: String,
    /// Sent as `X-API-KEY` when present.
    pub api_key: Option<String>,
    /// Client-side request cap. `None` leaves requests unbounded.
    pub timeout_secs: Option<u64>,
}

impl Default for StatsSourceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://stats.example.com/api/accounts".to_string(),
            api_key: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Maximum number of ranked entries returned.
    pub limit: usize,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self { limit: 100 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum number of snapshots surfaced per participant.
    pub limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { limit: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
