use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use blink_trigger::blink::{BlinkSession, ConfigError, SessionHandle};
use blink_trigger::config::Config;
use blink_trigger::detection::DetectionLoop;
use blink_trigger::dispatch::{spawn_dispatch_worker, ActionDispatcher, BlinkAction};
use blink_trigger::logging::{init_tracing, LogConfig};
use blink_trigger::routes::build_router;
use blink_trigger::source::ObservationSource;
use blink_trigger::state::AppState;
use tokio::sync::{broadcast, mpsc};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(e) = init_tracing(&LogConfig::from(&config)) {
        eprintln!("Invalid logging configuration: {e}");
        std::process::exit(2);
    }
    tracing::info!("Starting blink-trigger");

    let (session, action) = match build_session(&config) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    let source = match ObservationSource::open(&config.detection.source).await {
        Ok(source) => source.with_replay_fps(config.detection.replay_fps),
        Err(e) => {
            tracing::error!(error = %e, "Failed to open observation source");
            std::process::exit(1);
        }
    };

    let dispatcher = Arc::new(ActionDispatcher::new(
        action,
        config.action.enabled,
        config.action.timeout(),
    ));
    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    let dispatch_worker = spawn_dispatch_worker(dispatcher.clone(), dispatch_rx);

    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(
        SessionHandle::new(session),
        dispatcher,
        dispatch_tx,
        &config,
        shutdown_tx.clone(),
    );

    // 信号监听先订阅，避免输入过早结束时错过关闭广播
    let signal_rx = shutdown_tx.subscribe();

    let detection_handle = {
        let state = state.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        let shutdown_tx = shutdown_tx.clone();
        let exit_on_eof = config.detection.exit_on_eof;
        tokio::spawn(async move {
            match DetectionLoop::new(state, source).run(shutdown_rx).await {
                Ok(summary) => {
                    if summary.reached_eof && exit_on_eof {
                        tracing::info!("Observation source exhausted, shutting down");
                        let _ = shutdown_tx.send(());
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Detection loop failed");
                    let _ = shutdown_tx.send(());
                }
            }
        })
    };

    let app = build_router(state)
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    let server_future = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone(), signal_rx));

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
        let _ = shutdown_tx.send(());
    }

    if let Err(e) = detection_handle.await {
        tracing::error!(error = %e, "Detection task panicked");
    }
    // 所有发送端释放后分发任务处理完剩余事件再退出
    if let Err(e) = dispatch_worker.await {
        tracing::error!(error = %e, "Dispatch task panicked");
    }
    tracing::info!("Shutdown complete");
}

fn build_session(config: &Config) -> Result<(BlinkSession, Arc<dyn BlinkAction>), ConfigError> {
    let profile = config.detection.signal_profile()?;
    let frames = config.detection.frame_threshold()?;
    let action = config.action.build()?;
    tracing::info!(
        signal = profile.name(),
        closed_threshold = ?profile.closed_threshold(),
        consecutive_frames = frames,
        action = action.name(),
        dispatch_enabled = config.action.enabled,
        "Detection configured"
    );
    Ok((BlinkSession::new(profile, frames)?, action))
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origin.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_credentials(false)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any);
    }

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any),
        Err(e) => {
            panic!(
                "FATAL: Invalid CORS_ORIGIN '{}': {}. \
                 Fix the CORS_ORIGIN environment variable.",
                config.cors_origin, e
            );
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>, mut shutdown_rx: broadcast::Receiver<()>) {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
            _ = shutdown_rx.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = shutdown_rx.recv() => {},
        }
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
