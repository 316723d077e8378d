//! ステータスAPI
//!
//! 運用者・ダッシュボード向けの読み取り専用エンドポイント

use crate::api::error::AppError;
use crate::AppState;
use axum::{extract::State, Json};
use failover_common::error::CoordinatorError;
use failover_common::protocol::{RoutingResponse, StatusReport};

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.service.report().await)
}

/// GET /api/routing
///
/// トラフィックを受けられるエンドポイントが1つもなければ 503 を返す。
pub async fn get_routing(
    State(state): State<AppState>,
) -> Result<Json<RoutingResponse>, AppError> {
    let routing = state.service.routing().await;
    if routing.weights.is_empty() {
        return Err(CoordinatorError::NoEndpointsAvailable.into());
    }
    Ok(Json(routing))
}
