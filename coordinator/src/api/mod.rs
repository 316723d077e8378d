//! REST APIハンドラー
//!
//! ステータス取得、ルーティング情報、自動フェイルオーバーの切替、負荷率の受け付け

pub mod error;
pub mod failover;
pub mod status;

use crate::AppState;
use axum::{
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// APIルーターを作成
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status::get_status))
        .route("/api/routing", get(status::get_routing))
        .route(
            "/api/failover",
            get(failover::get_failover).put(failover::set_failover),
        )
        .route("/api/endpoints/:id/load", put(failover::update_load))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
