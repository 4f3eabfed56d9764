//! 重试机制实现
//!
//! 固定间隔重试：没有指数退避，也没有抖动。
//! 是否重试由纯函数 [`RetryPolicy::decide`] 决定，不依赖任何 I/O。

use std::future::Future;
use std::time::Duration;

use crate::processor::BridgeError;

/// 重试配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大尝试次数（包括首次请求），至少为 1
    max_attempts: u32,
    /// 两次尝试之间的固定间隔（毫秒）
    delay_ms: u64,
}

/// 一次失败尝试之后的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// 等待给定时间后发起下一次尝试
    Retry(Duration),
    /// 放弃，原样返回本次错误
    GiveUp,
}

impl RetryPolicy {
    /// 创建新的重试配置
    pub fn new(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// 第 `attempt` 次尝试（从 1 开始）以 `error` 失败后该做什么
    pub fn decide(&self, error: &BridgeError, attempt: u32) -> RetryDecision {
        if attempt < self.max_attempts && error.is_retryable() {
            RetryDecision::Retry(self.delay())
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// 重试器
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 带重试执行异步操作
    ///
    /// 操作函数接收当前尝试序号（从 1 开始）。耗尽后返回最后一次错误。
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, BridgeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let mut attempt = 1u32;

        loop {
            let error = match operation(attempt).await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            match self.policy.decide(&error, attempt) {
                RetryDecision::GiveUp => return Err(error),
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        "[BRIDGE] retrying opencode request attempt={}/{} reason={}",
                        attempt + 1,
                        self.policy.max_attempts,
                        error.reason_code()
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
