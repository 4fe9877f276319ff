//! 观测值与睁闭眼分类
//!
//! 每帧只产生一个观测值。分类器把观测值映射为"本帧是否闭眼"，
//! 与观测值类型不匹配的配置返回 `None`，由会话当作无效帧跳过。

use serde::{Deserialize, Serialize};

use crate::blink::ConfigError;
use crate::constants::{DEFAULT_AREA_RATIO_THRESHOLD, DEFAULT_EAR_THRESHOLD, MIN_OPEN_EYE_COUNT};

/// 单帧观测值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Observation {
    /// 检测到的眼睛数量
    EyeCount(u32),
    /// 连续睁眼比值，越小越接近闭眼
    AspectRatio(f64),
}

/// 把观测值判定为闭眼（`Some(true)`）、睁眼（`Some(false)`）或无法判定（`None`）
pub trait OpennessClassifier: Send + Sync {
    fn classify(&self, observation: &Observation) -> Option<bool>;
}

impl<F> OpennessClassifier for F
where
    F: Fn(&Observation) -> Option<bool> + Send + Sync,
{
    fn classify(&self, observation: &Observation) -> Option<bool> {
        self(observation)
    }
}

/// 信号配置
///
/// EAR 与面积比是两种不同刻度的信号，各自持有独立阈值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "camelCase")]
pub enum SignalProfile {
    /// Haar 级联眼睛计数：少于两只眼视为闭眼
    EyeCount,
    /// 关键点 EAR
    EyeAspectRatio { threshold: f64 },
    /// 眼部面积占面部面积的比值
    AreaRatio { threshold: f64 },
}

impl SignalProfile {
    pub fn eye_aspect_ratio() -> Self {
        SignalProfile::EyeAspectRatio {
            threshold: DEFAULT_EAR_THRESHOLD,
        }
    }

    pub fn area_ratio() -> Self {
        SignalProfile::AreaRatio {
            threshold: DEFAULT_AREA_RATIO_THRESHOLD,
        }
    }

    /// 按名称解析配置，`threshold` 仅对比值类信号生效
    pub fn from_name(name: &str, threshold: Option<f64>) -> Result<Self, ConfigError> {
        let profile = match name.trim().to_ascii_lowercase().as_str() {
            "eye_count" | "eyes" | "haar" => SignalProfile::EyeCount,
            "ear" | "eye_aspect_ratio" => SignalProfile::EyeAspectRatio {
                threshold: threshold.unwrap_or(DEFAULT_EAR_THRESHOLD),
            },
            "area_ratio" | "area" => SignalProfile::AreaRatio {
                threshold: threshold.unwrap_or(DEFAULT_AREA_RATIO_THRESHOLD),
            },
            other => return Err(ConfigError::UnknownSignal(other.to_string())),
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SignalProfile::EyeCount => Ok(()),
            SignalProfile::EyeAspectRatio { threshold } | SignalProfile::AreaRatio { threshold } => {
                if threshold.is_finite() && threshold > 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidClosedThreshold(threshold))
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalProfile::EyeCount => "eye_count",
            SignalProfile::EyeAspectRatio { .. } => "ear",
            SignalProfile::AreaRatio { .. } => "area_ratio",
        }
    }

    pub fn closed_threshold(&self) -> Option<f64> {
        match *self {
            SignalProfile::EyeCount => None,
            SignalProfile::EyeAspectRatio { threshold } | SignalProfile::AreaRatio { threshold } => {
                Some(threshold)
            }
        }
    }
}

impl OpennessClassifier for SignalProfile {
    fn classify(&self, observation: &Observation) -> Option<bool> {
        match (self, observation) {
            (SignalProfile::EyeCount, Observation::EyeCount(count)) => {
                Some(*count < MIN_OPEN_EYE_COUNT)
            }
            (
                SignalProfile::EyeAspectRatio { threshold } | SignalProfile::AreaRatio { threshold },
                Observation::AspectRatio(ratio),
            ) => Some(*ratio < *threshold),
            _ => None,
        }
    }
}
