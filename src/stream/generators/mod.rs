//! SSE 帧生成器
//!
//! - OpenAI SSE (data: {...})

pub mod openai_sse;

pub use openai_sse::{completion_id, unix_timestamp, OpenAiSseGenerator, SSE_DONE};
