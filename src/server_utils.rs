//! 服务器工具函数
//!
//! 响应构建等公共工具函数。

use crate::models::openai::{
    ChatCompletionResponse, Choice, ModelEntry, ModelList, ResponseMessage, Usage,
};
use crate::processor::Completion;
use crate::stream::{completion_id, unix_timestamp, OpenAiSseGenerator};
use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// 健康检查返回的服务名
pub const SERVICE_NAME: &str = "openclaw-opencode-bridge";

/// 模型列表中的 owned_by
pub const MODEL_OWNER: &str = "opencode-bridge";

/// 响应中的 model 字段：请求给出非空值时原样回显，否则使用对外公布的模型 ID
pub fn response_model(requested: Option<&str>, advertised: &str) -> String {
    requested
        .filter(|m| !m.is_empty())
        .unwrap_or(advertised)
        .to_string()
}

/// `GET /health` 响应体
pub fn health_body(opencode_base_url: &str, model_id: &str) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "service": SERVICE_NAME,
        "opencodeBaseUrl": opencode_base_url,
        "model": model_id,
    })
}

/// `GET /v1/models` 响应体，只公布一个模型
pub fn model_list(model_id: &str) -> ModelList {
    ModelList {
        object: "list",
        data: vec![ModelEntry {
            id: model_id.to_string(),
            object: "model",
            created: 0,
            owned_by: MODEL_OWNER,
        }],
    }
}

/// 构建 OpenAI 非流式响应体
pub fn completion_body(model: &str, completion: &Completion) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: completion_id(),
        object: "chat.completion",
        created: unix_timestamp(),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: "assistant",
                content: completion.text.clone(),
            },
            finish_reason: "stop",
        }],
        usage: Usage::new(
            completion.usage.input_tokens(),
            completion.usage.output_tokens(),
        ),
    }
}

/// 构建 OpenAI 非流式响应
pub fn build_openai_response(model: &str, completion: &Completion) -> Response {
    Json(completion_body(model, completion)).into_response()
}

/// 构建 OpenAI 流式响应 (SSE)
///
/// 回答已经完整拿到，这里只是按帧顺序写出后结束响应体。
pub fn build_openai_stream_response(model: &str, text: &str) -> Response {
    let frames = OpenAiSseGenerator::new(model).frames(text);

    let body_stream = async_stream::stream! {
        for frame in frames {
            yield Ok::<Bytes, std::convert::Infallible>(Bytes::from(frame));
        }
        tracing::debug!("[OPENAI_STREAM] 流结束");
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build SSE response: {}", e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap_or_default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::opencode::TokenUsage;

    #[test]
    fn test_response_model() {
        assert_eq!(response_model(Some("gpt-x"), "opencode-local"), "gpt-x");
        assert_eq!(response_model(Some(""), "opencode-local"), "opencode-local");
        assert_eq!(response_model(None, "opencode-local"), "opencode-local");
    }

    #[test]
    fn test_health_body() {
        let body = health_body("http://127.0.0.1:4096", "opencode-local");
        assert_eq!(
            body,
            serde_json::json!({
                "ok": true,
                "service": "openclaw-opencode-bridge",
                "opencodeBaseUrl": "http://127.0.0.1:4096",
                "model": "opencode-local"
            })
        );
    }

    #[test]
    fn test_model_list() {
        let value = serde_json::to_value(model_list("opencode-local")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "object": "list",
                "data": [{
                    "id": "opencode-local",
                    "object": "model",
                    "created": 0,
                    "owned_by": "opencode-bridge"
                }]
            })
        );
    }

    #[test]
    fn test_completion_body() {
        let completion = Completion {
            text: "Hello".to_string(),
            usage: TokenUsage {
                input: Some(3.0),
                output: None,
            },
        };
        let value = serde_json::to_value(completion_body("m", &completion)).unwrap();
        assert!(value["id"].as_str().unwrap().starts_with("chatcmpl-"));
        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["model"], "m");
        assert_eq!(
            value["choices"],
            serde_json::json!([{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello"},
                "finish_reason": "stop"
            }])
        );
        assert_eq!(
            value["usage"],
            serde_json::json!({"prompt_tokens": 3, "completion_tokens": 0, "total_tokens": 3})
        );
    }

    #[test]
    fn test_stream_response_headers() {
        let resp = build_openai_stream_response("m", "Hello");
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "text/event-stream; charset=utf-8"
        );
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-transform");
        assert_eq!(headers[header::CONNECTION], "keep-alive");
        assert_eq!(headers["x-accel-buffering"], "no");
    }
}
