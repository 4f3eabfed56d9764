//! Middleware 模块
//!
//! 提供 HTTP 请求处理的中间件组件

pub mod bridge_auth;

pub use bridge_auth::{BridgeAuthLayer, BridgeAuthService};
