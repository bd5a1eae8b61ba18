use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;

use crate::error::FieldError;

pub type Result<T, E = FieldError> = std::result::Result<T, E>;

impl FieldError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TargetNotFound(_) => StatusCode::NOT_FOUND,
            Self::PcaUnavailable | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BadRequest",
            Self::TargetNotFound(_) => "TargetNotFound",
            Self::PcaUnavailable => "PcaUnavailable",
            Self::Store(_) => "StoreFailure",
            Self::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for FieldError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        }
        let body = Json(json!({
            "success": false,
            "error": { "kind": self.kind(), "message": self.to_string() },
        }));
        (status, body).into_response()
    }
}
