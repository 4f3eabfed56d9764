//! opencode 会话 API 客户端
//!
//! 两个调用：`POST /session` 与 `POST /session/{id}/message`。
//! 每个调用携带独立的截止时间、同一份认证头，以及可选的 `directory` 查询参数。

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use url::Url;

use crate::config::{BridgeConfig, UpstreamAuth};
use crate::logger::sanitize_log_message;
use crate::models::opencode::{CreateSessionBody, MessageResult, PromptBody, SessionInfo};
use crate::processor::BridgeError;
use crate::providers::traits::SessionApi;
use crate::resilience::Deadline;

/// opencode 客户端
#[derive(Debug, Clone)]
pub struct OpencodeClient {
    base_url: String,
    auth: UpstreamAuth,
    directory: Option<String>,
    client: Client,
}

impl OpencodeClient {
    pub fn new(base_url: impl Into<String>, auth: UpstreamAuth, directory: Option<String>) -> Self {
        // 总超时由每次调用的 Deadline 控制，这里只限制连接阶段
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            directory: directory.filter(|d| !d.is_empty()),
            client,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            config.opencode_base_url.clone(),
            config.upstream_auth.clone(),
            config.directory.clone(),
        )
    }

    /// 构建完整的 API URL，带上 `directory` 查询参数
    fn build_url(&self, path: &str) -> Result<Url, BridgeError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| BridgeError::Internal(format!("invalid opencode url: {e}")))?;
        if let Some(directory) = &self.directory {
            url.query_pairs_mut().append_pair("directory", directory);
        }
        Ok(url)
    }

    /// 发送 JSON POST 并解析响应
    ///
    /// 非 2xx 转为 `UpstreamHttp`，响应体优先按 JSON 解析，失败时保留原始文本。
    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<serde_json::Value>, BridgeError> {
        let url = self.build_url(path)?;
        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(value) = self.auth.header_value() {
            request = request.header(header::AUTHORIZATION, value);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| BridgeError::Internal(format!("opencode request failed: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BridgeError::Internal(format!("opencode response read failed: {e}")))?;
        let payload = parse_response_body(&text);

        if !status.is_success() {
            let err = upstream_error(status, payload);
            tracing::warn!(
                "[OPENCODE] {} 返回错误: status={} message={}",
                path,
                status.as_u16(),
                sanitize_log_message(&err.to_string())
            );
            return Err(err);
        }

        Ok(payload)
    }
}

#[async_trait]
impl SessionApi for OpencodeClient {
    async fn create_session(&self, title: &str, deadline: Deadline) -> Result<String, BridgeError> {
        let payload = deadline
            .run(self.post_json("/session", &CreateSessionBody { title }))
            .await?;

        let session: SessionInfo = payload
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| BridgeError::Internal("opencode session response has no id".to_string()))?;

        tracing::debug!("[OPENCODE] 创建会话: id={}", session.id);
        Ok(session.id)
    }

    async fn send_message(
        &self,
        session_id: &str,
        body: &PromptBody,
        deadline: Deadline,
    ) -> Result<MessageResult, BridgeError> {
        let path = format!("/session/{}/message", urlencoding::encode(session_id));
        let payload = deadline.run(self.post_json(&path, body)).await?;

        // 形状不符的响应视为没有任何分段，交给空回答逻辑处理
        let result = match payload {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("[OPENCODE] 无法解析消息响应: {}", e);
                MessageResult::default()
            }),
            None => MessageResult::default(),
        };
        Ok(result)
    }
}

/// 响应体：空 → None，合法 JSON → 解析值，否则 → 原始字符串
fn parse_response_body(text: &str) -> Option<serde_json::Value> {
    if text.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(text)
            .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
    )
}

/// 从错误响应中提取可读消息
fn upstream_error(status: StatusCode, payload: Option<serde_json::Value>) -> BridgeError {
    let message = payload
        .as_ref()
        .and_then(|p| {
            p.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .or_else(|| {
                    p.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .filter(|m| !m.is_empty())
                })
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("opencode error {}", status.as_u16()));

    BridgeError::UpstreamHttp {
        status: status.as_u16(),
        message,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::opencode::{ModelRef, PromptPart};
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::post,
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// 记录收到的请求
    #[derive(Debug, Default)]
    struct Seen {
        auth: Vec<Option<String>>,
        directories: Vec<Option<String>>,
        bodies: Vec<serde_json::Value>,
        session_ids: Vec<String>,
    }

    async fn spawn_fake(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn recording_router(seen: Arc<Mutex<Seen>>) -> Router {
        let seen_session = seen.clone();
        let seen_message = seen;
        Router::new()
            .route(
                "/session",
                post(
                    move |headers: HeaderMap,
                          Query(q): Query<HashMap<String, String>>,
                          Json(body): Json<serde_json::Value>| {
                        let seen = seen_session.clone();
                        async move {
                            let mut s = seen.lock().unwrap();
                            s.auth.push(
                                headers
                                    .get("authorization")
                                    .map(|v| v.to_str().unwrap().to_string()),
                            );
                            s.directories.push(q.get("directory").cloned());
                            s.bodies.push(body);
                            Json(serde_json::json!({"id": "ses 1", "title": "openclaw-bridge"}))
                        }
                    },
                ),
            )
            .route(
                "/session/:id/message",
                post(
                    move |Path(id): Path<String>, Json(body): Json<serde_json::Value>| {
                        let seen = seen_message.clone();
                        async move {
                            let mut s = seen.lock().unwrap();
                            s.session_ids.push(id);
                            s.bodies.push(body);
                            Json(serde_json::json!({
                                "info": {"tokens": {"input": 3, "output": 2}, "finish": "stop"},
                                "parts": [{"type": "text", "text": "Hello"}]
                            }))
                        }
                    },
                ),
            )
    }

    #[tokio::test]
    async fn test_create_and_send_with_basic_auth_and_directory() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let base = spawn_fake(recording_router(seen.clone())).await;
        let client = OpencodeClient::new(
            format!("{base}/"),
            UpstreamAuth::Basic {
                username: "opencode".to_string(),
                password: "secret".to_string(),
            },
            Some("/work/repo".to_string()),
        );

        let id = client
            .create_session("openclaw-bridge", Deadline::from_millis(5000))
            .await
            .unwrap();
        assert_eq!(id, "ses 1");

        let body = PromptBody {
            parts: vec![PromptPart::text("USER:\nHi")],
            model: Some(ModelRef::new("p", "m")),
            agent: None,
            system: None,
        };
        let result = client
            .send_message(&id, &body, Deadline::from_millis(5000))
            .await
            .unwrap();
        assert_eq!(crate::translator::extract_text(&result), "Hello");
        assert_eq!(result.tokens().input_tokens(), 3);

        let s = seen.lock().unwrap();
        assert_eq!(s.auth, vec![Some("Basic b3BlbmNvZGU6c2VjcmV0".to_string())]);
        assert_eq!(s.directories, vec![Some("/work/repo".to_string())]);
        assert_eq!(s.bodies[0], serde_json::json!({"title": "openclaw-bridge"}));
        assert_eq!(
            s.bodies[1],
            serde_json::json!({
                "parts": [{"type": "text", "text": "USER:\nHi"}],
                "model": {"providerID": "p", "modelID": "m"}
            })
        );
        // 会话 ID 经过 URL 编码后被服务端还原
        assert_eq!(s.session_ids, vec!["ses 1".to_string()]);
    }

    #[tokio::test]
    async fn test_no_auth_header_when_not_configured() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let base = spawn_fake(recording_router(seen.clone())).await;
        let client = OpencodeClient::new(base, UpstreamAuth::None, None);

        client
            .create_session("t", Deadline::none())
            .await
            .unwrap();

        let s = seen.lock().unwrap();
        assert_eq!(s.auth, vec![None]);
        assert_eq!(s.directories, vec![None]);
    }

    #[tokio::test]
    async fn test_error_status_with_json_payload() {
        let router = Router::new().route(
            "/session",
            post(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(serde_json::json!({"error": {"message": "unknown provider"}})),
                )
            }),
        );
        let base = spawn_fake(router).await;
        let client = OpencodeClient::new(base, UpstreamAuth::None, None);

        let err = client
            .create_session("t", Deadline::from_millis(5000))
            .await
            .unwrap_err();
        match err {
            BridgeError::UpstreamHttp {
                status,
                message,
                payload,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "unknown provider");
                assert_eq!(
                    payload,
                    Some(serde_json::json!({"error": {"message": "unknown provider"}}))
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_with_text_payload() {
        let router = Router::new().route(
            "/session",
            post(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "upstream down") }),
        );
        let base = spawn_fake(router).await;
        let client = OpencodeClient::new(base, UpstreamAuth::None, None);

        let err = client
            .create_session("t", Deadline::from_millis(5000))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        match err {
            BridgeError::UpstreamHttp {
                status,
                message,
                payload,
            } => {
                assert_eq!(status, 503);
                assert_eq!(message, "opencode error 503");
                assert_eq!(payload, Some(serde_json::json!("upstream down")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let router = Router::new().route(
            "/session",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Json(serde_json::json!({"id": "late"}))
            }),
        );
        let base = spawn_fake(router).await;
        let client = OpencodeClient::new(base, UpstreamAuth::None, None);

        let err = client
            .create_session("t", Deadline::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { timeout_ms: 50 }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_non_json_message_response_has_no_parts() {
        let router = Router::new().route(
            "/session/:id/message",
            post(|| async { "plain text body" }),
        );
        let base = spawn_fake(router).await;
        let client = OpencodeClient::new(base, UpstreamAuth::None, None);

        let body = PromptBody {
            parts: vec![PromptPart::text("x")],
            model: None,
            agent: None,
            system: None,
        };
        let result = client
            .send_message("s", &body, Deadline::from_millis(5000))
            .await
            .unwrap();
        assert!(result.parts.is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_is_internal() {
        // 绑定后立即释放端口，保证没有服务监听
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpencodeClient::new(format!("http://{addr}"), UpstreamAuth::None, None);
        let err = client
            .create_session("t", Deadline::from_millis(5000))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Internal(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_response_body() {
        assert_eq!(parse_response_body(""), None);
        assert_eq!(
            parse_response_body(r#"{"a":1}"#),
            Some(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            parse_response_body("oops"),
            Some(serde_json::json!("oops"))
        );
    }

    #[test]
    fn test_upstream_error_message_precedence() {
        let err = upstream_error(
            StatusCode::BAD_GATEWAY,
            Some(serde_json::json!({"message": "top", "error": {"message": "nested"}})),
        );
        assert_eq!(err.to_string(), "top");

        let err = upstream_error(StatusCode::NOT_FOUND, None);
        assert_eq!(err.to_string(), "opencode error 404");
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_build_url_with_directory() {
        let client = OpencodeClient::new(
            "http://127.0.0.1:4096/api",
            UpstreamAuth::None,
            Some("/tmp/my dir".to_string()),
        );
        let url = client.build_url("/session").unwrap();
        assert_eq!(url.path(), "/api/session");
        assert_eq!(url.query(), Some("directory=%2Ftmp%2Fmy+dir"));
    }
}
