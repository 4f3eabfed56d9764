//! `POST /v1/chat/completions` 处理器

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::openai::ChatCompletionRequest;
use crate::processor::BridgeError;
use crate::server::AppState;
use crate::server_utils::{build_openai_response, build_openai_stream_response, response_model};

/// 处理 Chat Completions 请求
///
/// 补全在处理器 future 内完成；客户端断开时 hyper 丢弃该 future，
/// 上游请求和重试等待随之取消。
pub async fn chat_completions(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request = match body
        .map_err(body_rejection)
        .and_then(|bytes| parse_request(&bytes))
    {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("[BRIDGE] 请求体无效: {}", e);
            return e.into_response();
        }
    };

    let model = response_model(request.requested_model(), &state.config.model_id);
    let mut guard = InFlight::new(&model, request.stream);

    let result = state.processor.complete(&request).await;
    guard.finish();

    match result {
        Ok(completion) => {
            tracing::info!(
                "[BRIDGE] 补全完成: model={} stream={} chars={} elapsed_ms={}",
                model,
                request.stream,
                completion.text.chars().count(),
                guard.elapsed_ms()
            );
            if request.stream {
                build_openai_stream_response(&model, &completion.text)
            } else {
                build_openai_response(&model, &completion)
            }
        }
        Err(e) => e.into_response(),
    }
}

/// 解析请求体：空体视为 `{}`
fn parse_request(bytes: &[u8]) -> Result<ChatCompletionRequest, BridgeError> {
    if bytes.is_empty() {
        return Ok(ChatCompletionRequest::default());
    }
    serde_json::from_slice(bytes).map_err(|e| BridgeError::Validation(e.to_string()))
}

fn body_rejection(rejection: BytesRejection) -> BridgeError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        BridgeError::Validation("Request body too large".to_string())
    } else {
        BridgeError::Validation(rejection.body_text())
    }
}

/// 在途请求记录，未完成即被丢弃说明客户端已断开
struct InFlight {
    model: String,
    stream: bool,
    started: Instant,
    finished: bool,
}

impl InFlight {
    fn new(model: &str, stream: bool) -> Self {
        Self {
            model: model.to_string(),
            stream,
            started: Instant::now(),
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }

    fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                "[BRIDGE] 客户端已断开，放弃补全: model={} stream={} elapsed_ms={}",
                self.model,
                self.stream,
                self.elapsed_ms()
            );
        }
    }
}
