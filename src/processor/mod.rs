//! 请求处理器模块
//!
//! 校验并转换一次 Chat Completions 请求，然后在重试策略控制下
//! 反复执行「新建会话 → 发送消息 → 提取文本」，直到拿到非空回答或放弃。

mod error;

pub use error::BridgeError;

use std::sync::Arc;

use crate::config::{BridgeConfig, UpstreamTimeouts};
use crate::models::openai::ChatCompletionRequest;
use crate::models::opencode::{PromptBody, TokenUsage};
use crate::providers::SessionApi;
use crate::resilience::{Deadline, Retrier, RetryPolicy};
use crate::translator::{extract_text, part_types, OpencodeRequestTranslator, RequestTranslator};

/// 新建会话时使用的标题
pub const SESSION_TITLE: &str = "openclaw-bridge";

/// 一次成功的补全
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// 助手回答，保持上游原样（不 trim）
    pub text: String,
    pub usage: TokenUsage,
}

/// 补全处理器
///
/// 每次尝试都使用全新会话，不在请求之间或尝试之间复用。
#[derive(Clone)]
pub struct CompletionProcessor {
    api: Arc<dyn SessionApi>,
    translator: OpencodeRequestTranslator,
    retrier: Retrier,
    timeouts: UpstreamTimeouts,
}

impl CompletionProcessor {
    pub fn new(
        api: Arc<dyn SessionApi>,
        translator: OpencodeRequestTranslator,
        retrier: Retrier,
        timeouts: UpstreamTimeouts,
    ) -> Self {
        Self {
            api,
            translator,
            retrier,
            timeouts,
        }
    }

    /// 使用配置中的模型映射、默认值、超时和重试参数创建处理器
    pub fn from_config(api: Arc<dyn SessionApi>, config: &BridgeConfig) -> Self {
        Self::new(
            api,
            OpencodeRequestTranslator::from_config(config),
            Retrier::new(RetryPolicy::new(
                config.max_attempts(),
                config.retry.delay_ms,
            )),
            config.timeouts,
        )
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.retrier.policy()
    }

    /// 执行补全
    ///
    /// 校验失败直接返回，不产生任何上游调用。
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion, BridgeError> {
        let body = self.translator.translate_request(request)?;

        tracing::debug!(
            "[BRIDGE] 发送补全请求: model={:?} stream={}",
            body.model,
            request.stream
        );

        let result = self
            .retrier
            .execute(|attempt| self.attempt(&body, attempt))
            .await;

        if let Err(e) = &result {
            tracing::error!(
                "[BRIDGE] 补全失败: reason={} status={} message={}",
                e.reason_code(),
                e.status_code(),
                crate::logger::sanitize_log_message(&e.to_string())
            );
        }
        result
    }

    /// 单次尝试：新会话、发消息、提取文本
    async fn attempt(&self, body: &PromptBody, attempt: u32) -> Result<Completion, BridgeError> {
        let session_id = self
            .api
            .create_session(
                SESSION_TITLE,
                Deadline::from_millis(self.timeouts.session_ms),
            )
            .await?;

        let result = self
            .api
            .send_message(
                &session_id,
                body,
                Deadline::from_millis(self.timeouts.message_ms),
            )
            .await?;

        let text = extract_text(&result);
        if text.trim().is_empty() {
            let types = part_types(&result);
            tracing::warn!(
                "[BRIDGE] opencode 返回空回答: attempt={} session={} finish={:?} parts={:?}",
                attempt,
                session_id,
                result.finish(),
                types
            );
            return Err(BridgeError::EmptyAssistantText {
                finish: result.finish().map(str::to_string),
                part_types: types,
            });
        }

        Ok(Completion {
            text,
            usage: result.tokens(),
        })
    }
}

impl std::fmt::Debug for CompletionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProcessor")
            .field("translator", &self.translator)
            .field("retrier", &self.retrier)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}
