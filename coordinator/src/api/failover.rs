//! フェイルオーバー操作API

use crate::api::error::AppError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use failover_common::protocol::{FailoverToggle, LoadUpdateRequest};

/// GET /api/failover
pub async fn get_failover(State(state): State<AppState>) -> Json<FailoverToggle> {
    Json(FailoverToggle {
        enabled: state.service.auto_failover_enabled(),
    })
}

/// PUT /api/failover
pub async fn set_failover(
    State(state): State<AppState>,
    Json(req): Json<FailoverToggle>,
) -> Json<FailoverToggle> {
    state.service.set_auto_failover(req.enabled).await;
    Json(FailoverToggle {
        enabled: state.service.auto_failover_enabled(),
    })
}

/// PUT /api/endpoints/:id/load
pub async fn update_load(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<LoadUpdateRequest>,
) -> Result<StatusCode, AppError> {
    state.service.update_load(&id, req.load).await?;
    Ok(StatusCode::NO_CONTENT)
}
