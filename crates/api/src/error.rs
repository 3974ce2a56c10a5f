//! # API 统一错误处理
//!
//! 将下层各 crate 的错误类型统一映射到 HTTP 状态码与 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gridpulse_core::market::error::MarketError;
use thiserror::Error;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求参数错误 (400)
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    /// 下层业务错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                tracing::error!("Internal service error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "服务器内部错误".to_string(),
                )
            }
        };

        (status, Json(ApiErrorResponse::from_msg(message))).into_response()
    }
}

/// 非法品种 / 未知区间属于调用方错误，其余一律视为服务端错误
impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        if err.is_caller_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpulse_core::cache::error::CacheError;

    #[test]
    fn test_caller_errors_map_to_bad_request() {
        let err = ApiError::from(MarketError::UnknownTimeRange("2Y".to_string()));
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("2Y")));

        let err = ApiError::from(MarketError::InvalidCategory("gold".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_service_errors_map_to_internal() {
        let err = ApiError::from(MarketError::Cache(CacheError::Storage("down".to_string())));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(MarketError::NotInitialized);
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
