//! 公共校验函数
//! 启动配置与控制接口共用，非法值直接拒绝，不做截断。

use crate::blink::ConfigError;

/// 连续闭眼帧数阈值必须为正整数，且不超过 u32 范围
pub fn validate_frame_threshold(frames: i64) -> Result<u32, ConfigError> {
    if frames <= 0 {
        return Err(ConfigError::InvalidFrameThreshold(frames));
    }
    u32::try_from(frames).map_err(|_| ConfigError::InvalidFrameThreshold(frames))
}
