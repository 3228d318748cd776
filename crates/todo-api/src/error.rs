use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::{DomainError, TodoError};
use thiserror::Error;

/// ハンドラーが返すエラー
///
/// レスポンスは常に `{"error": "..."}` の形。Internal の詳細はログにのみ出す
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal { message: &'static str, detail: String },
}

impl ApiError {
    /// ストアのエラーを変換する。想定外の失敗は `message` を返す 500 になる
    pub fn from_store(error: TodoError, message: &'static str) -> Self {
        match error {
            TodoError::Validation(e) => e.into(),
            TodoError::NotFound(_) => ApiError::NotFound("Todo not found".to_string()),
            TodoError::Store(detail) => ApiError::Internal { message, detail },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        ApiError::BadRequest("Invalid request body".to_string())
    }
}

/// パスの id が UTF-8 としてデコードできない場合など
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameter");
        ApiError::BadRequest("Invalid todo ID".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { message, detail } = &self {
            tracing::error!(error = %detail, "{message}");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::TodoId;

    #[test]
    fn test_from_store_maps_status() {
        let not_found = ApiError::from_store(TodoError::NotFound(TodoId::new()), "Failed");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Todo not found");

        let validation = ApiError::from_store(DomainError::TextRequired.into(), "Failed");
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "Todo text is required");
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let error = ApiError::from_store(
            TodoError::store("ResourceNotFoundException: table todo-app"),
            "Failed to fetch todos",
        );

        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "Failed to fetch todos");
    }
}
