//! 流式输出层
//!
//! opencode 只返回完整回答，这里把完整文本切成 OpenAI 兼容的 SSE 帧序列。
//!
//! ```text
//! 完整回答 ──> [OpenAiSseGenerator] ──> role 帧 ─> content 帧 ─> stop 帧 ─> [DONE]
//! ```

pub mod generators;

pub use generators::{completion_id, unix_timestamp, OpenAiSseGenerator, SSE_DONE};
