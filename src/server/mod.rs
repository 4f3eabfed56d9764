//! HTTP 服务器
//!
//! 对外暴露 OpenAI 兼容接口：
//! - `GET /health` 不需要认证
//! - `GET /v1/models`、`POST /v1/chat/completions` 在配置了共享密钥时需要认证
//! - 其他路径或方法返回 JSON 404

pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::BridgeConfig;
use crate::middleware::BridgeAuthLayer;
use crate::processor::CompletionProcessor;
use crate::providers::{OpencodeClient, SessionApi};

/// 请求体上限：2 MiB
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// 共享状态，启动后不再修改
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    pub processor: CompletionProcessor,
}

impl AppState {
    pub fn new(config: BridgeConfig, api: Arc<dyn SessionApi>) -> Self {
        let processor = CompletionProcessor::from_config(api, &config);
        Self {
            config: Arc::new(config),
            processor,
        }
    }

    /// 使用真实的 opencode 客户端
    pub fn from_config(config: BridgeConfig) -> Self {
        let api = Arc::new(OpencodeClient::from_config(&config));
        Self::new(config, api)
    }
}

/// 构建路由
pub fn build_router(state: AppState) -> Router {
    let auth = BridgeAuthLayer::new(state.config.api_key.clone());

    // 认证只作用于已匹配的方法，方法不匹配直接走 404
    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::not_found),
        )
        .route(
            "/v1/models",
            get(handlers::models)
                .route_layer(auth.clone())
                .fallback(handlers::not_found),
        )
        .route(
            "/v1/chat/completions",
            post(handlers::chat_completions)
                .route_layer(auth)
                .fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 绑定地址并运行服务，直到进程退出
pub async fn serve(config: BridgeConfig) -> std::io::Result<()> {
    let addr = config
        .listen_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    tracing::info!("[SERVER] opencode base: {}", config.opencode_base_url);
    if config.api_key.is_none() {
        tracing::warn!("[SERVER] BRIDGE_API_KEY 未设置，接口不做认证");
    }

    let state = AppState::from_config(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "[SERVER] openclaw-opencode-bridge listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, build_router(state)).await
}
