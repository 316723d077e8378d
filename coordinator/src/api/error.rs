//! APIエラーレスポンス型
//!
//! axum用の共通エラーハンドリング

use axum::{http::StatusCode, response::IntoResponse, Json};
use failover_common::error::CoordinatorError;
use serde_json::json;
use tracing::warn;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub CoordinatorError);

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        AppError(err)
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoordinatorError::EndpointNotFound(_) => StatusCode::NOT_FOUND,
            CoordinatorError::NoEndpointsAvailable => StatusCode::SERVICE_UNAVAILABLE,
            CoordinatorError::Common(_) => StatusCode::BAD_REQUEST,
            CoordinatorError::Http(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // 詳細はログのみ。クライアントには external_message() を返す
        let status = self.status_code();
        warn!(status = %status, error = %self.0, "API request failed");

        let payload = json!({
            "error": self.0.external_message()
        });

        (status, Json(payload)).into_response()
    }
}
