//! 桥接错误类型
//!
//! 定义请求处理过程中可能发生的错误，以及它们的 HTTP 状态码、
//! 是否可重试和统一的 `{"error": {...}}` 响应格式。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// 处理错误
#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    /// 请求校验失败
    #[error("{0}")]
    Validation(String),

    /// 共享密钥校验失败
    #[error("Unauthorized")]
    Unauthorized,

    /// 路由不存在
    #[error("Not found")]
    NotFound,

    /// 上游调用超时
    #[error("opencode timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// 上游返回非 2xx
    #[error("{message}")]
    UpstreamHttp {
        status: u16,
        message: String,
        payload: Option<serde_json::Value>,
    },

    /// 上游成功返回但没有任何助手文本
    #[error("Model returned no assistant text")]
    EmptyAssistantText {
        finish: Option<String>,
        part_types: Vec<String>,
    },

    /// 内部错误
    #[error("{0}")]
    Internal(String),
}

impl BridgeError {
    /// 获取对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::Validation(_) => 400,
            BridgeError::Unauthorized => 401,
            BridgeError::NotFound => 404,
            BridgeError::Timeout { .. } => 504,
            BridgeError::UpstreamHttp { status, .. } if *status >= 400 => *status,
            BridgeError::UpstreamHttp { .. } => 502,
            BridgeError::EmptyAssistantText { .. } => 502,
            BridgeError::Internal(_) => 500,
        }
    }

    /// 检查是否为可重试错误
    ///
    /// 超时从不重试；上游 408/429/5xx 与空回答可重试。
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::UpstreamHttp { status, .. } => {
                matches!(*status, 408 | 429) || *status >= 500
            }
            BridgeError::EmptyAssistantText { .. } => true,
            _ => false,
        }
    }

    /// 用于日志的简短原因码
    pub fn reason_code(&self) -> &'static str {
        match self {
            BridgeError::Validation(_) => "VALIDATION",
            BridgeError::Unauthorized => "UNAUTHORIZED",
            BridgeError::NotFound => "NOT_FOUND",
            BridgeError::Timeout { .. } => "OPENCODE_TIMEOUT",
            BridgeError::UpstreamHttp { .. } => "OPENCODE_HTTP",
            BridgeError::EmptyAssistantText { .. } => "EMPTY_ASSISTANT_TEXT",
            BridgeError::Internal(_) => "INTERNAL",
        }
    }

    /// 获取错误类型字符串
    pub fn error_type(&self) -> &'static str {
        if self.status_code() >= 500 {
            "server_error"
        } else {
            "invalid_request_error"
        }
    }

    /// 上游诊断信息
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            BridgeError::UpstreamHttp { payload, .. } => payload.clone(),
            BridgeError::EmptyAssistantText { finish, part_types } => Some(serde_json::json!({
                "finish": finish,
                "partTypes": part_types,
            })),
            _ => None,
        }
    }

    /// 转换为 JSON 错误响应
    pub fn to_json(&self) -> serde_json::Value {
        let mut error = serde_json::json!({
            "message": self.to_string(),
            "type": self.error_type(),
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }
        serde_json::json!({ "error": error })
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
