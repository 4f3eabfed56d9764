//! opencode 响应 → 助手文本

use crate::models::opencode::MessageResult;

/// 文本分段的类型标记
pub const TEXT_PART_TYPE: &str = "text";

/// 按顺序拼接所有 `text` 分段的文本，不加分隔符
pub fn extract_text(result: &MessageResult) -> String {
    result
        .parts
        .iter()
        .filter(|p| p.part_type.as_deref() == Some(TEXT_PART_TYPE))
        .filter_map(|p| p.text.as_ref().and_then(|t| t.as_str()))
        .collect()
}

/// 列出所有分段类型，用于空回答诊断
pub fn part_types(result: &MessageResult) -> Vec<String> {
    result
        .parts
        .iter()
        .map(|p| {
            p.part_type
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "unknown".to_string())
        })
        .collect()
}
