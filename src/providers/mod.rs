//! 上游 Provider 模块
//!
//! 目前只有 opencode 会话 API 一个上游。

pub mod opencode;
pub mod traits;

pub use opencode::OpencodeClient;
pub use traits::SessionApi;
