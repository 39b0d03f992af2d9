use axum::{extract::State, http::StatusCode, Json};
use reconcile::{save_snapshot, ReconcileError, SaveOutcome};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::state::SharedState;

#[derive(Deserialize)]
pub struct SaveRequest {
    pub rows: Vec<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SaveResponse {
    #[serde(flatten)]
    pub outcome: SaveOutcome,
    pub message: String,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

pub async fn get_news(
    State(state): State<SharedState>,
) -> Result<Json<Vec<serde_json::Value>>, (StatusCode, String)> {
    let rows = state
        .store
        .load_snapshot(&state.schema, state.cfg.row_limit)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to load news: {e}")))?;
    Ok(Json(rows))
}

pub async fn save_news(
    State(state): State<SharedState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, (StatusCode, String)> {
    let outcome = save_snapshot(&state.store, &state.schema, &req.rows)
        .await
        .map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("save failed: {e}");
            } else {
                warn!("save rejected: {e}");
            }
            (status, e.to_string())
        })?;

    Ok(Json(SaveResponse {
        message: outcome.message(),
        outcome,
        saved_at: chrono::Utc::now(),
    }))
}

fn status_for(e: &ReconcileError) -> StatusCode {
    match e {
        ReconcileError::MalformedSubmission(_) => StatusCode::BAD_REQUEST,
        ReconcileError::Baseline(_) => StatusCode::SERVICE_UNAVAILABLE,
        ReconcileError::Write(_) | ReconcileError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
