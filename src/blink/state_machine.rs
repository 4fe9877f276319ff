//! 连续闭眼计数状态机
//!
//! 闭眼帧累加游程长度；遇到睁眼帧时，若刚结束的游程达到阈值则确认一次眨眼。
//! 眨眼必须"完成"（重新睁眼）才会被确认，闭眼持续到会话结束不会产生事件。

use serde::Serialize;

use crate::blink::ConfigError;
use crate::constants::DEFAULT_CONSECUTIVE_FRAMES;

/// 一次确认的眨眼，`blink_number` 为确认后的累计次数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlinkEvent {
    pub blink_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlinkStateMachine {
    closed_run_length: u32,
    total_blinks: u64,
    consecutive_frames_threshold: u32,
}

impl Default for BlinkStateMachine {
    fn default() -> Self {
        Self {
            closed_run_length: 0,
            total_blinks: 0,
            consecutive_frames_threshold: DEFAULT_CONSECUTIVE_FRAMES,
        }
    }
}

impl BlinkStateMachine {
    pub fn new(consecutive_frames_threshold: u32) -> Result<Self, ConfigError> {
        validate_threshold(consecutive_frames_threshold)?;
        Ok(Self {
            consecutive_frames_threshold,
            ..Self::default()
        })
    }

    pub fn update(&mut self, is_closed: bool) -> Option<BlinkEvent> {
        if is_closed {
            self.closed_run_length = self.closed_run_length.saturating_add(1);
            return None;
        }

        let event = if self.closed_run_length >= self.consecutive_frames_threshold {
            self.total_blinks += 1;
            Some(BlinkEvent {
                blink_number: self.total_blinks,
            })
        } else {
            None
        };
        self.closed_run_length = 0;
        event
    }

    /// 修改阈值，只影响之后的比较，不改动进行中的游程
    pub fn set_threshold(&mut self, frames: u32) -> Result<(), ConfigError> {
        validate_threshold(frames)?;
        self.consecutive_frames_threshold = frames;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.closed_run_length = 0;
        self.total_blinks = 0;
    }

    pub fn closed_run_length(&self) -> u32 {
        self.closed_run_length
    }

    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }

    pub fn threshold(&self) -> u32 {
        self.consecutive_frames_threshold
    }
}

fn validate_threshold(frames: u32) -> Result<(), ConfigError> {
    if frames == 0 {
        return Err(ConfigError::InvalidFrameThreshold(0));
    }
    Ok(())
}
