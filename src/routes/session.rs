use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blink::{SignalProfile, StatsSnapshot};
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::validate_frame_threshold;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/reset", post(reset_session))
        .route("/sensitivity", put(update_sensitivity))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    session_id: Uuid,
    profile: SignalProfile,
    stats: StatsSnapshot,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensitivityRequest {
    consecutive_frames: i64,
}

async fn session_view(state: &AppState) -> SessionView {
    SessionView {
        session_id: state.session().id(),
        profile: state.session().profile(),
        stats: state.session().snapshot().await,
    }
}

async fn get_session(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    Ok(ok(session_view(&state).await))
}

async fn reset_session(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    state.session().reset().await;
    Ok(ok(session_view(&state).await))
}

async fn update_sensitivity(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SensitivityRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let frames = validate_frame_threshold(req.consecutive_frames)?;
    state.session().set_consecutive_frames(frames).await?;
    Ok(ok(session_view(&state).await))
}
