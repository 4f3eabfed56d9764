//! opencode 会话 API 数据结构

use serde::{Deserialize, Serialize};

/// 上游 provider/model 组合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    #[serde(rename = "providerID")]
    pub provider_id: String,
    #[serde(rename = "modelID")]
    pub model_id: String,
}

impl ModelRef {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
        }
    }
}

/// 创建会话请求体
#[derive(Debug, Serialize)]
pub struct CreateSessionBody<'a> {
    pub title: &'a str,
}

/// 创建会话响应（只关心 id）
#[derive(Debug, Deserialize)]
pub struct SessionInfo {
    pub id: String,
}

/// 发送消息请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptBody {
    pub parts: Vec<PromptPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptPart {
    #[serde(rename = "type")]
    pub part_type: &'static str,
    pub text: String,
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            part_type: "text",
            text: text.into(),
        }
    }
}

/// 发送消息响应
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResult {
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    #[serde(default)]
    pub info: Option<MessageInfo>,
}

impl MessageResult {
    pub fn tokens(&self) -> TokenUsage {
        self.info
            .as_ref()
            .and_then(|info| info.tokens)
            .unwrap_or_default()
    }

    pub fn finish(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.finish.as_deref())
    }
}

/// 响应分段
///
/// `text` 保持原始 JSON 值，只有字符串才计入回答文本。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "type", default)]
    pub part_type: Option<String>,
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageInfo {
    #[serde(default)]
    pub tokens: Option<TokenUsage>,
    #[serde(default)]
    pub finish: Option<String>,
}

/// token 统计，上游可能给出浮点或 null
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input: Option<f64>,
    #[serde(default)]
    pub output: Option<f64>,
}

impl TokenUsage {
    pub fn input_tokens(&self) -> u64 {
        self.input.unwrap_or(0.0).max(0.0) as u64
    }

    pub fn output_tokens(&self) -> u64 {
        self.output.unwrap_or(0.0).max(0.0) as u64
    }
}
