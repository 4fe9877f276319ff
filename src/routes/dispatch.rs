use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_dispatch).put(update_dispatch))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DispatchToggle {
    enabled: bool,
}

async fn get_dispatch(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(state.dispatcher().status()))
}

async fn update_dispatch(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DispatchToggle>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.dispatcher().set_enabled(req.enabled);
    Ok(ok(state.dispatcher().status()))
}
