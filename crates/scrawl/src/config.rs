//! Server bootstrap configuration.
//!
//! Loaded once at start-up from a JSON file:
//!
//! ```json
//! {
//!   "tick_rate_hz": 2,
//!   "word_list_dir": "words",
//!   "rooms": [
//!     { "name": "default", "word_list": "default" },
//!     { "name": "speed", "word_list": "animals", "round_time_secs": 60 }
//!   ]
//! }
//! ```
//!
//! Every room key besides `name` and `word_list` is a [`RoomParams`]
//! field; anything left out takes its default.

use std::io;
use std::path::{Path, PathBuf};

use scrawl_room::RoomParams;
use scrawl_tick::TickConfig;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides where the config file lives.
pub const CONFIG_PATH_ENV: &str = "SCRAWL_CONFIG_PATH";

/// Where the config file is looked for by default.
pub const DEFAULT_CONFIG_PATH: &str = "config/scrawl.json";

/// Errors loading configuration or word lists.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No word list by that name (or the name isn't allowed).
    #[error("unknown word list {0:?}")]
    UnknownWordList(String),
}

/// Process-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// How often every room is ticked. 0 disables ticking.
    pub tick_rate_hz: u32,

    /// Directory holding `<name>.txt` word lists.
    pub word_list_dir: PathBuf,

    /// Rooms to create at start-up.
    pub rooms: Vec<RoomDefinition>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: TickConfig::DEFAULT_TICK_RATE_HZ,
            word_list_dir: PathBuf::from("words"),
            rooms: vec![RoomDefinition::default()],
        }
    }
}

/// One room to create at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDefinition {
    pub name: String,

    #[serde(default = "default_word_list")]
    pub word_list: String,

    #[serde(flatten)]
    pub params: RoomParams,
}

impl Default for RoomDefinition {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            word_list: default_word_list(),
            params: RoomParams::default(),
        }
    }
}

fn default_word_list() -> String {
    "default".to_string()
}

impl ServerConfig {
    /// Loads from `$SCRAWL_CONFIG_PATH`, or [`DEFAULT_CONFIG_PATH`] if the
    /// variable isn't set.
    ///
    /// # Errors
    /// See [`ServerConfig::load_from`].
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Loads from `path`. A missing file gives the default configuration.
    ///
    /// # Errors
    /// [`ConfigError::Read`] if the file exists but can't be read,
    /// [`ConfigError::Parse`] if it isn't valid configuration JSON.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), rooms = config.rooms.len(), "config loaded");
        Ok(config)
    }

    /// Tick settings for the room ticker.
    pub fn tick_config(&self) -> TickConfig {
        TickConfig::with_rate(self.tick_rate_hz)
    }
}
