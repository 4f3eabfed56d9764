//! OpenAI messages → opencode 提示词
//!
//! opencode 只接收一段文本提示加一个可选的 system 字段，
//! 所以多轮对话被压平成 `ROLE:\n文本` 块。

use crate::models::openai::{ChatMessage, MessageContent};

/// 压平后的提示词
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptText {
    pub prompt: String,
    pub system: String,
}

impl PromptText {
    /// 提示词是否包含可用文本
    pub fn is_usable(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    /// 非空时返回 system 文本
    pub fn system(&self) -> Option<&str> {
        Some(self.system.as_str()).filter(|s| !s.is_empty())
    }
}

/// 从消息内容中提取文本
///
/// 字符串原样返回；分段数组只取 `text` / `input_text` 分段，跳过空文本，用换行拼接。
pub fn text_from_content(content: Option<&MessageContent>) -> String {
    match content {
        Some(MessageContent::Text(text)) => text.clone(),
        Some(MessageContent::Parts(parts)) => parts
            .iter()
            .filter(|p| p.is_text())
            .filter_map(|p| p.text.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Some(MessageContent::Other(_)) | None => String::new(),
    }
}

/// 构建提示词
///
/// system 消息合并到 `system`（空行分隔，整体 trim）；其余消息按原顺序渲染为
/// `"<ROLE>:\n<text>"`，以空行分隔。提取不到文本的消息直接跳过。
pub fn build_prompt(messages: &[ChatMessage]) -> PromptText {
    let mut blocks = Vec::new();
    let mut system_blocks = Vec::new();

    for msg in messages {
        let text = text_from_content(msg.content.as_ref());
        if text.is_empty() {
            continue;
        }

        let role = msg.role();
        if role == "system" {
            system_blocks.push(text);
            continue;
        }
        blocks.push(format!("{}:\n{}", role.to_uppercase(), text));
    }

    PromptText {
        prompt: blocks.join("\n\n"),
        system: system_blocks.join("\n\n").trim().to_string(),
    }
}

/// 合并配置中的默认 system 与请求中的 system，空段省略
pub fn merge_system(default_system: Option<&str>, request_system: Option<&str>) -> Option<String> {
    let merged = [default_system, request_system]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    Some(merged).filter(|s| !s.is_empty())
}
