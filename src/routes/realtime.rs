use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{extract::State, Router};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::response::AppError;
use crate::state::AppState;

struct SseGuard(Arc<AtomicUsize>);

impl SseGuard {
    fn acquire(counter: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        let current = counter.fetch_add(1, Ordering::SeqCst);
        if current >= max {
            counter.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(Self(counter.clone()))
    }
}

impl Drop for SseGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(sse_handler))
}

/// 推送眨眼事件；连接时先发一次当前统计快照
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Some(guard) =
        SseGuard::acquire(state.sse_connections(), state.config().max_sse_connections)
    else {
        return Err(AppError::too_many_requests("Too many SSE connections"));
    };

    let mut shutdown_rx = state.shutdown_rx();
    let mut events_rx = state.subscribe_events();

    let stream = async_stream::stream! {
        let _guard = guard;

        let snapshot = state.session().snapshot().await;
        if let Ok(json) = serde_json::to_string(&snapshot) {
            yield Ok(Event::default().event("stats").data(json));
        }

        loop {
            tokio::select! {
                received = events_rx.recv() => match received {
                    Ok(notice) => {
                        if let Ok(json) = serde_json::to_string(&notice) {
                            yield Ok(Event::default().event("blink").data(json));
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "SSE subscriber lagged behind blink events");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}
