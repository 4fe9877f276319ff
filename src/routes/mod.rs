pub mod dispatch;
pub mod health;
pub mod realtime;
pub mod session;

use axum::extract::DefaultBodyLimit;
use axum::Router;

use crate::state::AppState;

/// 控制接口只接收很小的 JSON 请求体
const MAX_BODY_SIZE: usize = 16 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/session", session::router())
        .nest("/dispatch", dispatch::router())
        .nest("/realtime", realtime::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .with_state(state)
}
