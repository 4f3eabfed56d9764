//! OpenAI 兼容的 Chat Completions 桥接服务
//!
//! 把 `POST /v1/chat/completions` 转换为 opencode 会话 API 调用：
//! 每次尝试新建会话、发送一条压平后的提示词，再把回答包装成
//! OpenAI 格式（JSON 或 SSE）返回。

pub mod config;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod processor;
pub mod providers;
pub mod resilience;
pub mod server;
pub mod server_utils;
pub mod stream;
pub mod translator;

pub use config::{BridgeConfig, ConfigError};
pub use processor::{BridgeError, Completion, CompletionProcessor};
pub use providers::{OpencodeClient, SessionApi};
pub use server::{build_router, serve, AppState};
