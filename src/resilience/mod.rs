//! 容错机制模块
//!
//! 提供固定间隔重试和单次调用超时控制功能

mod retry;
mod timeout;

pub use retry::{Retrier, RetryDecision, RetryPolicy};
pub use timeout::Deadline;
