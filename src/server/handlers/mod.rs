//! 路由处理器
//!
//! - `chat`: `POST /v1/chat/completions`
//! - 其余为无上游调用的简单端点

mod chat;

pub use chat::chat_completions;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};

use crate::processor::BridgeError;
use crate::server::AppState;
use crate::server_utils::{health_body, model_list};

/// `GET /health`，不做认证
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(health_body(
        &state.config.opencode_base_url,
        &state.config.model_id,
    ))
}

/// `GET /v1/models`
pub async fn models(State(state): State<AppState>) -> Response {
    Json(model_list(&state.config.model_id)).into_response()
}

/// 未知路径或方法
pub async fn not_found() -> Response {
    BridgeError::NotFound.into_response()
}
