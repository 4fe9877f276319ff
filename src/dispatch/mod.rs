pub mod actions;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::blink::BlinkEvent;

pub use actions::{CommandAction, LogAction, WebhookAction};

/// 对外发布的眨眼通知
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlinkNotice {
    pub session_id: Uuid,
    pub blink_number: u64,
    pub detected_at: DateTime<Utc>,
}

impl BlinkNotice {
    pub fn new(session_id: Uuid, event: BlinkEvent) -> Self {
        Self {
            session_id,
            blink_number: event.blink_number,
            detected_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("action timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("command exited with status {0}")]
    CommandStatus(String),
    #[error("webhook request failed: {0}")]
    Network(String),
    #[error("webhook returned status {0}")]
    WebhookStatus(u16),
}

/// 眨眼触发的外部动作（按键模拟、脚本、Webhook 等）
pub trait BlinkAction: Send + Sync {
    fn name(&self) -> &'static str;

    fn trigger<'a>(&'a self, notice: &'a BlinkNotice) -> BoxFuture<'a, Result<(), ActionError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    Disabled,
    Failed,
}

#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pub dispatched: AtomicU64,
    pub suppressed: AtomicU64,
    pub failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStatus {
    pub enabled: bool,
    pub action: &'static str,
    pub dispatched: u64,
    pub suppressed: u64,
    pub failed: u64,
}

/// 动作分发器
///
/// 是否启用在分发时读取；动作失败只记录日志和计数，不向上传播。
pub struct ActionDispatcher {
    action: Arc<dyn BlinkAction>,
    enabled: AtomicBool,
    timeout: Duration,
    metrics: DispatchMetrics,
}

impl ActionDispatcher {
    pub fn new(action: Arc<dyn BlinkAction>, enabled: bool, timeout: Duration) -> Self {
        Self {
            action,
            enabled: AtomicBool::new(enabled),
            timeout,
            metrics: DispatchMetrics::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!(
            action = self.action.name(),
            enabled,
            "Action dispatch {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn status(&self) -> DispatchStatus {
        DispatchStatus {
            enabled: self.is_enabled(),
            action: self.action.name(),
            dispatched: self.metrics.dispatched.load(Ordering::Relaxed),
            suppressed: self.metrics.suppressed.load(Ordering::Relaxed),
            failed: self.metrics.failed.load(Ordering::Relaxed),
        }
    }

    pub async fn dispatch(&self, notice: &BlinkNotice) -> DispatchOutcome {
        if !self.is_enabled() {
            self.metrics.suppressed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(blink_number = notice.blink_number, "Action dispatch disabled, skipping");
            return DispatchOutcome::Disabled;
        }

        let result = match tokio::time::timeout(self.timeout, self.action.trigger(notice)).await {
            Ok(result) => result,
            Err(_) => Err(ActionError::Timeout(self.timeout)),
        };

        match result {
            Ok(()) => {
                self.metrics.dispatched.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    action = self.action.name(),
                    blink_number = notice.blink_number,
                    "Blink #{} dispatched",
                    notice.blink_number
                );
                DispatchOutcome::Dispatched
            }
            Err(e) => {
                self.metrics.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    action = self.action.name(),
                    blink_number = notice.blink_number,
                    error = %e,
                    "Blink action failed"
                );
                DispatchOutcome::Failed
            }
        }
    }
}

/// 后台分发任务，按到达顺序逐条分发，通道关闭后退出
pub fn spawn_dispatch_worker(
    dispatcher: Arc<ActionDispatcher>,
    mut rx: mpsc::UnboundedReceiver<BlinkNotice>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notice) = rx.recv().await {
            dispatcher.dispatch(&notice).await;
        }
        tracing::debug!("Dispatch worker exited");
    })
}
