//! OpenAI SSE 生成器
//!
//! 将一段完整的助手回答转换为 OpenAI Chat Completions SSE 帧。
//!
//! # 格式说明
//!
//! ```text
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","created":1234567890,"model":"m","choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}
//!
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","created":1234567890,"model":"m","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}
//!
//! data: {"id":"chatcmpl-xxx","object":"chat.completion.chunk","created":1234567890,"model":"m","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}
//!
//! data: [DONE]
//! ```

use serde::Serialize;

/// 流结束标记
pub const SSE_DONE: &str = "data: [DONE]\n\n";

/// 生成补全 ID，流式与非流式共用同一格式
pub fn completion_id() -> String {
    format!("chatcmpl-{}", uuid::Uuid::new_v4())
}

/// 当前 Unix 时间戳（秒）
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// OpenAI SSE 生成器
///
/// 同一生成器产生的所有帧共享 `id`、`created` 和 `model`。
#[derive(Debug, Clone)]
pub struct OpenAiSseGenerator {
    /// 响应 ID
    response_id: String,
    /// 模型名称
    model: String,
    /// 创建时间戳
    created: i64,
}

impl OpenAiSseGenerator {
    /// 创建新的生成器
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_id(completion_id(), model)
    }

    /// 使用指定的响应 ID 创建生成器
    pub fn with_id(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            response_id: id.into(),
            model: model.into(),
            created: unix_timestamp(),
        }
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn created(&self) -> i64 {
        self.created
    }

    /// 首帧：声明 assistant 角色
    pub fn role_frame(&self) -> String {
        self.frame(
            OpenAiDelta {
                role: Some("assistant"),
                content: None,
            },
            None,
        )
    }

    /// 内容帧：一次性携带完整回答
    pub fn content_frame(&self, text: &str) -> String {
        self.frame(
            OpenAiDelta {
                role: None,
                content: Some(text),
            },
            None,
        )
    }

    /// 结束帧：空 delta + finish_reason=stop
    pub fn stop_frame(&self) -> String {
        self.frame(
            OpenAiDelta {
                role: None,
                content: None,
            },
            Some("stop"),
        )
    }

    /// 完整帧序列；回答为空时省略内容帧
    pub fn frames(&self, text: &str) -> Vec<String> {
        let mut frames = Vec::with_capacity(4);
        frames.push(self.role_frame());
        if !text.is_empty() {
            frames.push(self.content_frame(text));
        }
        frames.push(self.stop_frame());
        frames.push(SSE_DONE.to_string());
        frames
    }

    fn frame(&self, delta: OpenAiDelta<'_>, finish_reason: Option<&'static str>) -> String {
        let chunk = OpenAiStreamChunk {
            id: &self.response_id,
            object: "chat.completion.chunk",
            created: self.created,
            model: &self.model,
            choices: vec![OpenAiChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        };
        // 所有字段都是字符串和整数，序列化不会失败
        let json = serde_json::to_string(&chunk).unwrap_or_default();
        format!("data: {json}\n\n")
    }
}

#[derive(Debug, Serialize)]
struct OpenAiStreamChunk<'a> {
    id: &'a str,
    object: &'static str,
    created: i64,
    model: &'a str,
    choices: Vec<OpenAiChoice<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAiChoice<'a> {
    index: u32,
    delta: OpenAiDelta<'a>,
    /// 未结束时显式输出 null
    finish_reason: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct OpenAiDelta<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}
