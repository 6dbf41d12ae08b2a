//! Application-level configuration loading for gameplay tuning values.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ANIGUESS_BACK_CONFIG_PATH";

/// Rooms and all room-scoped state expire after this many seconds of life.
const DEFAULT_ROOM_TTL_SECS: u64 = 4 * 3600;
/// Cached character hashes and name indexes live this long.
const DEFAULT_CHARACTER_CACHE_TTL_SECS: u64 = 24 * 3600;
/// Maximum number of players allowed into a single room.
const DEFAULT_MAX_PLAYERS: usize = 4;
/// Number of characters in a generated room code.
const DEFAULT_ROOM_CODE_LENGTH: usize = 6;
/// Attempts at generating a non-colliding room code before giving up.
const DEFAULT_ROOM_CODE_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    room_ttl_secs: u64,
    character_cache_ttl_secs: u64,
    max_players: usize,
    room_code_length: usize,
    room_code_attempts: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded gameplay tuning from config");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Time-to-live applied to rooms and every room-scoped key on each write.
    pub fn room_ttl(&self) -> Duration {
        Duration::from_secs(self.room_ttl_secs)
    }

    /// Time-to-live applied to cached character data and name indexes.
    pub fn character_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.character_cache_ttl_secs)
    }

    /// Maximum room roster size.
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Length of generated room codes.
    pub fn room_code_length(&self) -> usize {
        self.room_code_length
    }

    /// Bound on room-code generation retries when codes collide.
    pub fn room_code_attempts(&self) -> u32 {
        self.room_code_attempts
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room_ttl_secs: DEFAULT_ROOM_TTL_SECS,
            character_cache_ttl_secs: DEFAULT_CHARACTER_CACHE_TTL_SECS,
            max_players: DEFAULT_MAX_PLAYERS,
            room_code_length: DEFAULT_ROOM_CODE_LENGTH,
            room_code_attempts: DEFAULT_ROOM_CODE_ATTEMPTS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    room_ttl_secs: Option<u64>,
    character_cache_ttl_secs: Option<u64>,
    max_players: Option<usize>,
    room_code_length: Option<usize>,
    room_code_attempts: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            room_ttl_secs: value.room_ttl_secs.unwrap_or(defaults.room_ttl_secs),
            character_cache_ttl_secs: value
                .character_cache_ttl_secs
                .unwrap_or(defaults.character_cache_ttl_secs),
            max_players: value.max_players.unwrap_or(defaults.max_players),
            room_code_length: value.room_code_length.unwrap_or(defaults.room_code_length),
            room_code_attempts: value
                .room_code_attempts
                .unwrap_or(defaults.room_code_attempts),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
