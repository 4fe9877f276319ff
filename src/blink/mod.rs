//! 眨眼判定引擎
//!
//! 将逐帧的睁眼程度观测值去抖为离散的眨眼事件：
//! 观测值 → 分类器（闭眼 / 睁眼）→ 状态机（连续闭眼帧计数）→ 事件。
//!
//! ## 模块
//! - `observation`: 观测值与信号配置（眼数 / EAR / 面积比）
//! - `signal`: 从关键点或检测框计算睁眼比值
//! - `state_machine`: 连续闭眼计数状态机
//! - `session`: 单个检测会话，带统计快照与共享句柄

pub mod observation;
pub mod session;
pub mod signal;
pub mod state_machine;

pub use observation::{Observation, OpennessClassifier, SignalProfile};
pub use session::{BlinkSession, FrameOutcome, SessionHandle, StatsSnapshot};
pub use state_machine::{BlinkEvent, BlinkStateMachine};

use thiserror::Error;

/// 配置校验错误：非法值直接拒绝，不做截断
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("consecutive frame threshold must be a positive integer, got {0}")]
    InvalidFrameThreshold(i64),
    #[error("closed threshold must be a positive finite number, got {0}")]
    InvalidClosedThreshold(f64),
    #[error("unknown signal profile: {0}")]
    UnknownSignal(String),
    #[error("unknown action kind: {0}")]
    UnknownAction(String),
    #[error("missing setting {0} for the configured action")]
    MissingSetting(&'static str),
}
