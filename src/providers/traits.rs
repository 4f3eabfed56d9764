//! 上游会话 API Trait 定义
//!
//! 重试控制器只依赖这个接口，便于在测试中替换为脚本化实现。

use async_trait::async_trait;

use crate::models::opencode::{MessageResult, PromptBody};
use crate::processor::BridgeError;
use crate::resilience::Deadline;

/// 会话 API
///
/// 每个方法只做一次尝试，不重试、不缓存会话。
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// 创建新会话，返回会话 ID
    async fn create_session(&self, title: &str, deadline: Deadline) -> Result<String, BridgeError>;

    /// 向会话发送一条消息并等待完整回答
    async fn send_message(
        &self,
        session_id: &str,
        body: &PromptBody,
        deadline: Deadline,
    ) -> Result<MessageResult, BridgeError>;
}
