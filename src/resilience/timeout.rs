//! 超时控制实现
//!
//! 每次上游调用各自携带一个 `Deadline`，互不影响。

use std::future::Future;
use std::time::{Duration, Instant};

use crate::processor::BridgeError;

/// 单次调用的截止时间配置（毫秒），0 表示无超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    timeout_ms: u64,
}

impl Deadline {
    pub fn from_millis(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// 创建无超时的截止时间
    pub fn none() -> Self {
        Self { timeout_ms: 0 }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// 获取超时 Duration
    pub fn duration(&self) -> Option<Duration> {
        if self.timeout_ms > 0 {
            Some(Duration::from_millis(self.timeout_ms))
        } else {
            None
        }
    }

    /// 在截止时间内执行异步操作
    ///
    /// 超时后操作被丢弃（连带取消其中的 I/O），返回 `BridgeError::Timeout`。
    pub async fn run<F, T>(&self, operation: F) -> Result<T, BridgeError>
    where
        F: Future<Output = Result<T, BridgeError>>,
    {
        let start = Instant::now();

        match self.duration() {
            Some(timeout) => match tokio::time::timeout(timeout, operation).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        "[OPENCODE] 调用超时: 配置 {}ms, 已耗时 {}ms",
                        self.timeout_ms,
                        start.elapsed().as_millis()
                    );
                    Err(BridgeError::Timeout {
                        timeout_ms: self.timeout_ms,
                    })
                }
            },
            None => operation.await,
        }
    }
}
