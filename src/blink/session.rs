use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::blink::observation::{Observation, OpennessClassifier, SignalProfile};
use crate::blink::state_machine::{BlinkEvent, BlinkStateMachine};
use crate::blink::ConfigError;

/// 只读统计快照，供渲染 / 日志 / 控制接口拉取
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_blinks: u64,
    pub closed_run_length: u32,
    pub last_observation: Option<Observation>,
    pub threshold: u32,
    pub frames_processed: u64,
    pub frames_skipped: u64,
}

/// 单帧处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// 帧已计入状态机，可能确认了一次眨眼
    Counted(Option<BlinkEvent>),
    /// 没有观测值或观测值无法分类，状态保持不变
    Skipped,
}

impl FrameOutcome {
    pub fn event(self) -> Option<BlinkEvent> {
        match self {
            FrameOutcome::Counted(event) => event,
            FrameOutcome::Skipped => None,
        }
    }
}

/// 一个检测会话：分类器 + 状态机 + 帧统计
#[derive(Debug)]
pub struct BlinkSession<C = SignalProfile> {
    classifier: C,
    machine: BlinkStateMachine,
    last_observation: Option<Observation>,
    frames_processed: u64,
    frames_skipped: u64,
}

impl<C: OpennessClassifier> BlinkSession<C> {
    pub fn new(classifier: C, consecutive_frames: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            classifier,
            machine: BlinkStateMachine::new(consecutive_frames)?,
            last_observation: None,
            frames_processed: 0,
            frames_skipped: 0,
        })
    }

    /// 处理一帧；`None` 表示本帧没有可用观测值
    pub fn observe(&mut self, observation: Option<Observation>) -> FrameOutcome {
        let Some(observation) = observation else {
            self.frames_skipped += 1;
            return FrameOutcome::Skipped;
        };

        let Some(is_closed) = self.classifier.classify(&observation) else {
            tracing::debug!(?observation, "Observation does not match signal profile, frame skipped");
            self.frames_skipped += 1;
            return FrameOutcome::Skipped;
        };

        self.last_observation = Some(observation);
        self.frames_processed += 1;

        let event = self.machine.update(is_closed);
        if let Some(event) = event {
            tracing::info!(blink_number = event.blink_number, "Blink confirmed");
        }
        FrameOutcome::Counted(event)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_blinks: self.machine.total_blinks(),
            closed_run_length: self.machine.closed_run_length(),
            last_observation: self.last_observation,
            threshold: self.machine.threshold(),
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
        }
    }

    /// 清零眨眼计数、游程与帧统计，阈值和分类器保持不变
    pub fn reset(&mut self) {
        self.machine.reset();
        self.frames_processed = 0;
        self.frames_skipped = 0;
    }

    pub fn set_consecutive_frames(&mut self, frames: u32) -> Result<(), ConfigError> {
        self.machine.set_threshold(frames)
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

/// 会话的共享句柄
///
/// 检测循环与控制接口通过同一把互斥锁访问会话，每次调用只持锁一次 O(1) 操作。
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    profile: SignalProfile,
    inner: Arc<Mutex<BlinkSession>>,
}

impl SessionHandle {
    pub fn new(session: BlinkSession) -> Self {
        let profile = *session.classifier();
        Self {
            id: Uuid::new_v4(),
            profile,
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> SignalProfile {
        self.profile
    }

    pub async fn observe(&self, observation: Option<Observation>) -> FrameOutcome {
        self.inner.lock().await.observe(observation)
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn reset(&self) {
        self.inner.lock().await.reset();
        tracing::info!(session_id = %self.id, "Blink counter reset");
    }

    pub async fn set_consecutive_frames(&self, frames: u32) -> Result<(), ConfigError> {
        self.inner.lock().await.set_consecutive_frames(frames)?;
        tracing::info!(session_id = %self.id, frames, "Sensitivity updated");
        Ok(())
    }
}
