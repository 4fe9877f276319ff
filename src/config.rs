use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::blink::{ConfigError, SignalProfile};
use crate::constants::{
    DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_CONSECUTIVE_FRAMES, DEFAULT_MAX_SSE_CONNECTIONS,
};
use crate::dispatch::{BlinkAction, CommandAction, LogAction, WebhookAction};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub max_sse_connections: usize,
    pub detection: DetectionConfig,
    pub action: ActionConfig,
}

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub signal: String,
    pub closed_threshold: Option<f64>,
    pub consecutive_frames: i64,
    pub source: String,
    pub replay_fps: u32,
    pub exit_on_eof: bool,
}

#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub kind: String,
    pub enabled: bool,
    pub command: String,
    pub webhook_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 7878_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            max_sse_connections: env_or_parse("MAX_SSE_CONNECTIONS", DEFAULT_MAX_SSE_CONNECTIONS),
            detection: DetectionConfig {
                signal: env_or("BLINK_SIGNAL", "eye_count"),
                closed_threshold: env_opt_parse("BLINK_CLOSED_THRESHOLD"),
                consecutive_frames: env_or_parse(
                    "BLINK_CONSECUTIVE_FRAMES",
                    i64::from(DEFAULT_CONSECUTIVE_FRAMES),
                ),
                source: env_or("BLINK_SOURCE", "-"),
                replay_fps: env_or_parse("BLINK_REPLAY_FPS", 0_u32),
                exit_on_eof: env_or_bool("BLINK_EXIT_ON_EOF", true),
            },
            action: ActionConfig {
                kind: env_or("BLINK_ACTION", "log"),
                enabled: env_or_bool("BLINK_DISPATCH_ENABLED", true),
                command: env_or("BLINK_ACTION_COMMAND", ""),
                webhook_url: env_or("BLINK_ACTION_WEBHOOK_URL", ""),
                timeout_secs: env_or_parse("BLINK_ACTION_TIMEOUT_SECS", DEFAULT_ACTION_TIMEOUT_SECS),
            },
        }
    }
}

impl DetectionConfig {
    pub fn signal_profile(&self) -> Result<SignalProfile, ConfigError> {
        SignalProfile::from_name(&self.signal, self.closed_threshold)
    }

    pub fn frame_threshold(&self) -> Result<u32, ConfigError> {
        crate::validation::validate_frame_threshold(self.consecutive_frames)
    }
}

impl ActionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn build(&self) -> Result<Arc<dyn BlinkAction>, ConfigError> {
        match self.kind.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Arc::new(LogAction)),
            "command" => CommandAction::parse(&self.command)
                .map(|action| Arc::new(action) as Arc<dyn BlinkAction>)
                .ok_or(ConfigError::MissingSetting("BLINK_ACTION_COMMAND")),
            "webhook" => {
                if self.webhook_url.trim().is_empty() {
                    return Err(ConfigError::MissingSetting("BLINK_ACTION_WEBHOOK_URL"));
                }
                Ok(Arc::new(WebhookAction::new(
                    self.webhook_url.trim(),
                    self.timeout(),
                )))
            }
            other => Err(ConfigError::UnknownAction(other.to_string())),
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_opt_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Failed to parse env var, ignoring");
            None
        }
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
