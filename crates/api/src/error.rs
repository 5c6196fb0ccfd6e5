use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imgfleet_core::FleetError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("协调器错误: {0}")]
    Fleet(#[from] FleetError),

    #[error("请求冲突: {0}")]
    Conflict(String),

    #[error("服务不可用: {0}")]
    Unavailable(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Fleet(FleetError::ProtocolViolation(_)) | ApiError::Conflict(_) => {
                (StatusCode::CONFLICT, "PROTOCOL_VIOLATION")
            }
            ApiError::Fleet(FleetError::Channel(_)) | ApiError::Unavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DISPATCHER_UNAVAILABLE")
            }
            ApiError::Fleet(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.classify();
        let suggestions: Vec<&str> = match status {
            StatusCode::CONFLICT => vec!["worker 收到终止信号后不应再发送拉取请求"],
            StatusCode::SERVICE_UNAVAILABLE => vec!["本次运行可能已经结束，查看 GET /health"],
            _ => vec!["查看协调器日志获取详情"],
        };

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
