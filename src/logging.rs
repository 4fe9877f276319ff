use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "blink-trigger";
const MAX_LOG_FILES: usize = 14;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log files in {dir}: {source}")]
    Appender {
        dir: String,
        #[source]
        source: InitError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// 初始化全局 tracing：标准输出 + 可选的按天滚动 JSON 文件日志
///
/// 眨眼确认、计数重置、灵敏度调整都会写入这里的日志。
/// 全局 subscriber 已存在时（如同一进程内的多个测试）直接返回。
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let file_layer = if config.enable_file_logs {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .max_log_files(MAX_LOG_FILES)
            .build(&config.log_dir)
            .map_err(|source| LoggingError::Appender {
                dir: config.log_dir.clone(),
                source,
            })?;
        Some(fmt::layer().with_writer(appender).with_ansi(false).json())
    } else {
        None
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
    {
        Err(e) if e.to_string().contains("already been set") => Ok(()),
        result => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = LogConfig::default();
        init_tracing(&cfg).unwrap();
        init_tracing(&cfg).unwrap();
    }

    #[test]
    fn unusable_log_dir_is_an_error() {
        let blocker = tempfile::NamedTempFile::new().expect("tempfile");
        let cfg = LogConfig {
            enable_file_logs: true,
            log_dir: blocker.path().join("logs").to_string_lossy().to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            init_tracing(&cfg),
            Err(LoggingError::Appender { .. })
        ));
    }

    #[test]
    fn log_config_follows_app_config() {
        let mut config = Config::from_env();
        config.log_level = "debug".to_string();
        config.enable_file_logs = true;
        let log = LogConfig::from(&config);
        assert_eq!(log.log_level, "debug");
        assert!(log.enable_file_logs);
    }
}
