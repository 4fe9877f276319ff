//! 检测主循环：逐帧读取观测值，更新会话并发布眨眼事件

use serde::Serialize;
use tokio::sync::broadcast;

use crate::blink::StatsSnapshot;
use crate::source::{Frame, ObservationSource, SourceError};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub stats: StatsSnapshot,
    pub reached_eof: bool,
}

pub struct DetectionLoop {
    state: AppState,
    source: ObservationSource,
}

impl DetectionLoop {
    pub fn new(state: AppState, source: ObservationSource) -> Self {
        Self { state, source }
    }

    /// 运行到输入结束或收到关闭信号
    pub async fn run(
        mut self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<SessionSummary, SourceError> {
        tracing::info!(
            session_id = %self.state.session().id(),
            signal = self.state.session().profile().name(),
            "Detection loop started"
        );

        let reached_eof = loop {
            let frame = tokio::select! {
                frame = self.source.next_frame() => frame?,
                _ = shutdown_rx.recv() => break false,
            };
            let Some(frame) = frame else {
                break true;
            };
            self.handle_frame(frame).await;
        };

        let stats = self.state.session().snapshot().await;
        tracing::info!(
            total_blinks = stats.total_blinks,
            frames_processed = stats.frames_processed,
            frames_skipped = stats.frames_skipped,
            reached_eof,
            "Detection session summary"
        );
        Ok(SessionSummary { stats, reached_eof })
    }

    async fn handle_frame(&mut self, frame: Frame) {
        if let Frame::Invalid { line, reason } = &frame {
            tracing::warn!(line, %reason, "Unreadable observation, frame skipped");
        }

        let outcome = self.state.session().observe(frame.observation()).await;
        if let Some(event) = outcome.event() {
            self.state.publish(event);
        }
    }
}
