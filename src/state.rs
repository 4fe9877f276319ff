use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};

use crate::blink::{BlinkEvent, SessionHandle};
use crate::config::Config;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::dispatch::{ActionDispatcher, BlinkNotice};

#[derive(Clone)]
pub struct AppState {
    session: SessionHandle,
    dispatcher: Arc<ActionDispatcher>,
    dispatch_tx: mpsc::UnboundedSender<BlinkNotice>,
    events_tx: broadcast::Sender<BlinkNotice>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    sse_connections: Arc<AtomicUsize>,
    started_at: Instant,
}

impl AppState {
    /// `dispatch_tx` 的接收端应交给 [`crate::dispatch::spawn_dispatch_worker`]
    pub fn new(
        session: SessionHandle,
        dispatcher: Arc<ActionDispatcher>,
        dispatch_tx: mpsc::UnboundedSender<BlinkNotice>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session,
            dispatcher,
            dispatch_tx,
            events_tx,
            config: Arc::new(config.clone()),
            shutdown_tx,
            sse_connections: Arc::new(AtomicUsize::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 发布一次确认的眨眼：交给分发任务，并广播给实时订阅者
    pub fn publish(&self, event: BlinkEvent) -> BlinkNotice {
        let notice = BlinkNotice::new(self.session.id(), event);
        if self.dispatch_tx.send(notice.clone()).is_err() {
            tracing::warn!(
                blink_number = notice.blink_number,
                "Dispatch worker is gone, action not triggered"
            );
        }
        // 没有订阅者时发送失败属于正常情况
        let _ = self.events_tx.send(notice.clone());
        notice
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<BlinkNotice> {
        self.events_tx.subscribe()
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_tx(&self) -> &broadcast::Sender<()> {
        &self.shutdown_tx
    }

    /// 当前实例的 SSE 连接计数
    pub fn sse_connections(&self) -> &Arc<AtomicUsize> {
        &self.sse_connections
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
