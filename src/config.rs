//! Server configuration.
//!
//! Values come from built-in defaults, an optional TOML file, environment
//! variables (after `.env` is loaded), and finally CLI flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Environment variable overriding the bind host.
pub const HOST_ENV: &str = "POLLED_GAMES_HOST";

/// Environment variable overriding the bind port.
pub const PORT_ENV: &str = "POLLED_GAMES_PORT";

/// Smallest and largest board the server will ever create.
const BOARD_SIZE_LIMITS: (usize, usize) = (1, 5);

/// Configuration for the game server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// How long a long-poll waits before the stalled side forfeits.
    #[serde(default = "default_long_poll_timeout_secs")]
    long_poll_timeout_secs: u64,

    /// Board size used when `size` is absent or unparseable.
    #[serde(default = "default_board_size")]
    default_board_size: usize,

    /// Smallest board size a client may request.
    #[serde(default = "default_min_board_size")]
    min_board_size: usize,

    /// Largest board size a client may request.
    #[serde(default = "default_max_board_size")]
    max_board_size: usize,

    /// Finished matches older than this are evicted. Unset keeps them forever.
    #[serde(default)]
    finished_match_retention_secs: Option<u64>,

    /// How often the eviction sweep runs.
    #[serde(default = "default_eviction_interval_secs")]
    eviction_interval_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_long_poll_timeout_secs() -> u64 {
    60
}

fn default_board_size() -> usize {
    3
}

fn default_min_board_size() -> usize {
    BOARD_SIZE_LIMITS.0
}

fn default_max_board_size() -> usize {
    BOARD_SIZE_LIMITS.1
}

fn default_eviction_interval_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            long_poll_timeout_secs: default_long_poll_timeout_secs(),
            default_board_size: default_board_size(),
            min_board_size: default_min_board_size(),
            max_board_size: default_max_board_size(),
            finished_match_retention_secs: None,
            eviction_interval_secs: default_eviction_interval_secs(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Omitted keys take defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            host = %config.host,
            port = config.port,
            retention = ?config.finished_match_retention_secs,
            "Read server config"
        );
        Ok(config)
    }

    /// Applies `POLLED_GAMES_HOST` / `POLLED_GAMES_PORT` if set.
    #[instrument(skip(self))]
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = std::env::var(HOST_ENV) {
            debug!(%host, "Host from environment");
            self.host = host;
        }
        if let Ok(value) = std::env::var(PORT_ENV) {
            self.port = parse_port(&value)?;
            debug!(port = self.port, "Port from environment");
        }
        Ok(self)
    }

    /// Replaces the bind address where a CLI flag was given.
    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Checks board-size bounds and timeouts.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = BOARD_SIZE_LIMITS;
        if self.min_board_size < lo || self.max_board_size > hi {
            return Err(ConfigError::Invalid(format!(
                "Board size bounds must lie within {}..={}, got {}..={}",
                lo, hi, self.min_board_size, self.max_board_size
            )));
        }
        if !(self.min_board_size..=self.max_board_size).contains(&self.default_board_size) {
            return Err(ConfigError::Invalid(format!(
                "Default board size {} outside {}..={}",
                self.default_board_size, self.min_board_size, self.max_board_size
            )));
        }
        if self.long_poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid("long_poll_timeout_secs must be positive".to_string()));
        }
        if self.finished_match_retention_secs.is_some() && self.eviction_interval_secs == 0 {
            return Err(ConfigError::Invalid("eviction_interval_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Long-poll timeout as a duration.
    pub fn long_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.long_poll_timeout_secs)
    }

    /// Retention for finished matches, if eviction is enabled.
    pub fn retention(&self) -> Option<Duration> {
        self.finished_match_retention_secs.map(Duration::from_secs)
    }

    /// Interval between eviction sweeps.
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    /// Board size for a raw `size` query value: default when absent or not
    /// an integer, otherwise clamped into the configured bounds.
    pub fn board_size_for(&self, raw: Option<&str>) -> usize {
        let Some(requested) = raw.and_then(|s| s.trim().parse::<i64>().ok()) else {
            return self.default_board_size;
        };
        let clamped = requested.clamp(self.min_board_size as i64, self.max_board_size as i64);
        if clamped != requested {
            warn!(requested, clamped, "Board size out of range, clamping");
        }
        clamped as usize
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|source| ConfigError::Env {
        var: PORT_ENV,
        value: value.to_string(),
        source,
    })
}

/// Why a configuration could not be loaded or used.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[display("cannot read config file {}: {}", path.display(), source)]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`ServerConfig`].
    #[display("cannot parse config file {}: {}", path.display(), source)]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying TOML failure.
        source: toml::de::Error,
    },

    /// An environment override holds an unusable value.
    #[display("invalid {}={:?}: {}", var, value, source)]
    Env {
        /// Variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
        /// Underlying parse failure.
        source: std::num::ParseIntError,
    },

    /// The values parse but break a constraint.
    #[display("invalid config: {}", _0)]
    Invalid(#[error(not(source))] String),
}
