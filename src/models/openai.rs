//! OpenAI Chat Completions 数据结构
//!
//! 只覆盖桥接需要的字段：请求侧宽松解析，响应侧严格按 OpenAI 线上格式序列化。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat Completions 请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    /// 字符串原样保留，数字转为字符串，其他形态视为未给出
    #[serde(default, deserialize_with = "lenient_model")]
    pub model: Option<String>,
    /// 非数组（包括 null）按缺失处理，数组中的非对象元素被跳过
    #[serde(default, deserialize_with = "lenient_messages")]
    pub messages: Vec<ChatMessage>,
    #[serde(default, deserialize_with = "truthy")]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// 请求中显式给出的模型名（空字符串视为未给出）
    pub fn requested_model(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }
}

fn lenient_model<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_messages<'de, D>(deserializer: D) -> Result<Vec<ChatMessage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(ChatMessage::from_value).collect(),
        _ => Vec::new(),
    })
}

/// `stream` 按 JSON 真值解释
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// 单条消息
#[derive(Debug, Clone, Default)]
pub struct ChatMessage {
    pub role: Option<String>,
    pub content: Option<MessageContent>,
}

impl ChatMessage {
    /// 从任意 JSON 值读取消息，非对象返回 `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            role: obj.get("role").and_then(role_text),
            content: obj.get("content").map(MessageContent::from_value),
        })
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or("user")
    }
}

/// role 转为字符串；空串、null、false 视为未给出
fn role_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for ChatMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ChatMessage::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("message must be a JSON object"))
    }
}

/// 消息内容：纯文本或分段数组
///
/// 其他 JSON 形态落入 `Other`，视为没有文本。
#[derive(Debug, Clone)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(Value),
}

impl MessageContent {
    /// 分段数组中非对象的元素被逐个跳过，不影响其他分段
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => MessageContent::Text(text.clone()),
            Value::Array(items) => {
                MessageContent::Parts(items.iter().filter_map(ContentPart::from_value).collect())
            }
            other => MessageContent::Other(other.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(MessageContent::from_value(&Value::deserialize(deserializer)?))
    }
}

/// 内容分段
#[derive(Debug, Clone, Default)]
pub struct ContentPart {
    pub part_type: Option<String>,
    /// 只有字符串 text 被保留
    pub text: Option<String>,
}

impl ContentPart {
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            part_type: field("type"),
            text: field("text"),
        })
    }

    /// 是否为纯文本分段
    pub fn is_text(&self) -> bool {
        matches!(self.part_type.as_deref(), Some("text") | Some("input_text"))
    }
}

// ============================================================================
// 响应结构
// ============================================================================

/// 非流式响应
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// 模型列表
#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: &'static str,
}
