use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use blink_trigger::blink::{BlinkSession, SessionHandle, SignalProfile};
use blink_trigger::config::{ActionConfig, Config, DetectionConfig};
use blink_trigger::dispatch::{
    spawn_dispatch_worker, ActionDispatcher, ActionError, BlinkAction, BlinkNotice,
};
use blink_trigger::routes::build_router;
use blink_trigger::state::AppState;

/// 记录每次触发的眨眼序号
#[derive(Default)]
pub struct RecordingAction {
    seen: Mutex<Vec<u64>>,
}

impl RecordingAction {
    pub fn seen(&self) -> Vec<u64> {
        self.seen.lock().expect("recording lock").clone()
    }
}

impl BlinkAction for RecordingAction {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn trigger<'a>(&'a self, notice: &'a BlinkNotice) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(async move {
            self.seen
                .lock()
                .expect("recording lock")
                .push(notice.blink_number);
            Ok(())
        })
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub action: Arc<RecordingAction>,
    pub dispatch_worker: JoinHandle<()>,
}

pub fn test_config(consecutive_frames: i64) -> Config {
    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 0,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "*".to_string(),
        max_sse_connections: 64,
        detection: DetectionConfig {
            signal: "eye_count".to_string(),
            closed_threshold: None,
            consecutive_frames,
            source: "-".to_string(),
            replay_fps: 0,
            exit_on_eof: true,
        },
        action: ActionConfig {
            kind: "log".to_string(),
            enabled: true,
            command: String::new(),
            webhook_url: String::new(),
            timeout_secs: 1,
        },
    }
}

pub fn spawn_with_profile(profile: SignalProfile, consecutive_frames: u32) -> TestApp {
    spawn_with_config(test_config(i64::from(consecutive_frames)), profile)
}

pub fn spawn_with_sse_limit(max_sse_connections: usize) -> TestApp {
    let config = Config {
        max_sse_connections,
        ..test_config(3)
    };
    spawn_with_config(config, SignalProfile::EyeCount)
}

fn spawn_with_config(config: Config, profile: SignalProfile) -> TestApp {
    let consecutive_frames = config
        .detection
        .frame_threshold()
        .expect("test frame threshold");
    let session =
        SessionHandle::new(BlinkSession::new(profile, consecutive_frames).expect("session"));

    let action = Arc::new(RecordingAction::default());
    let dispatcher = Arc::new(ActionDispatcher::new(
        action.clone(),
        config.action.enabled,
        Duration::from_secs(1),
    ));
    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    let dispatch_worker = spawn_dispatch_worker(dispatcher.clone(), dispatch_rx);
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(session, dispatcher, dispatch_tx, &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        action,
        dispatch_worker,
    }
}

pub fn spawn_test_app() -> TestApp {
    spawn_with_profile(SignalProfile::EyeCount, 3)
}

impl TestApp {
    /// 释放所有发送端并等待分发任务处理完剩余事件
    pub async fn drain_dispatch(self) -> Arc<RecordingAction> {
        let TestApp {
            app,
            state,
            action,
            dispatch_worker,
            ..
        } = self;
        drop(app);
        drop(state);
        dispatch_worker.await.expect("dispatch worker");
        action
    }
}
