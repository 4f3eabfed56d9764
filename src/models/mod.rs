//! 数据模型
//!
//! - `openai`: 对外暴露的 Chat Completions 格式
//! - `opencode`: 上游会话 API 格式

pub mod openai;
pub mod opencode;
