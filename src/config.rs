use std::{env, path::PathBuf, time::Duration};

use crate::game_theme::GameTheme;

// Logical field. The renderer scales this onto whatever surface it owns.
pub const SCREEN_WIDTH: f64 = 640.0;
pub const SCREEN_HEIGHT: f64 = 480.0;
pub const FIELD_BORDER_WIDTH: f64 = 10.0;

pub const DEFAULT_MAX_SCORE: i8 = 10;
pub const TICKS_PER_SECOND: u64 = 60;

pub const GAME_STATE_CHANNEL_CAPACITY: usize = 64;

const DEFAULT_SERVER_HOST: &str = "game.go-go.dev";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub secure: bool,
    pub dial_timeout: Duration,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
    pub http_timeout: Duration,
    pub max_score: i8,
    pub theme: GameTheme,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_SERVER_HOST.to_string(),
            secure: true,
            dial_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            http_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_score: DEFAULT_MAX_SCORE,
            theme: GameTheme::Monokai,
            log_file: PathBuf::from("pong.log"),
        }
    }
}

impl Config {
    /// Reads `PONG_*` variables, falling back to defaults for anything missing
    /// or unparsable.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            server_host: env::var("PONG_SERVER_HOST").unwrap_or(defaults.server_host),
            secure: parse_env("PONG_SERVER_SECURE").unwrap_or(defaults.secure),
            dial_timeout: millis_env("PONG_DIAL_TIMEOUT_MS").unwrap_or(defaults.dial_timeout),
            write_timeout: millis_env("PONG_WRITE_TIMEOUT_MS").unwrap_or(defaults.write_timeout),
            read_timeout: millis_env("PONG_READ_TIMEOUT_MS").unwrap_or(defaults.read_timeout),
            http_timeout: millis_env("PONG_HTTP_TIMEOUT_MS").unwrap_or(defaults.http_timeout),
            max_score: parse_env::<i8>("PONG_MAX_SCORE")
                .filter(|score| *score > 0)
                .unwrap_or(defaults.max_score),
            theme: env::var("PONG_THEME")
                .ok()
                .and_then(|name| GameTheme::from_name(&name))
                .unwrap_or(defaults.theme),
            log_file: env::var("PONG_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }

    pub fn websocket_url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{path}", self.server_host)
    }

    pub fn http_url(&self, path: &str) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}{path}", self.server_host)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn millis_env(key: &str) -> Option<Duration> {
    parse_env::<u64>(key).map(Duration::from_millis)
}
