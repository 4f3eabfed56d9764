//! 共享密钥认证中间件
//!
//! 配置了 `BRIDGE_API_KEY` 时，要求请求携带 `Authorization: Bearer <key>`。
//! 未配置时直接放行。密钥比较使用常量时间。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, Request},
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};

use crate::processor::BridgeError;

/// 认证 Layer
#[derive(Clone)]
pub struct BridgeAuthLayer {
    api_key: Option<Arc<str>>,
}

impl BridgeAuthLayer {
    /// 空字符串视为未配置
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.is_empty()).map(Arc::from),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl<S> Layer<S> for BridgeAuthLayer {
    type Service = BridgeAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BridgeAuthService {
            inner,
            api_key: self.api_key.clone(),
        }
    }
}

/// 认证 Service
#[derive(Clone)]
pub struct BridgeAuthService<S> {
    inner: S,
    api_key: Option<Arc<str>>,
}

impl<S> Service<Request<Body>> for BridgeAuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if let Some(expected) = &self.api_key {
            if !is_authorized(&req, expected) {
                tracing::warn!(
                    "[AUTH] 拒绝未授权请求: {} {}",
                    req.method(),
                    req.uri().path()
                );
                return Box::pin(async { Ok(BridgeError::Unauthorized.into_response()) });
            }
        }

        let fut = self.inner.call(req);
        Box::pin(fut)
    }
}

/// 从 `Authorization: Bearer <token>` 中取出 token 并与密钥比较
fn is_authorized(req: &Request<Body>, expected: &str) -> bool {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or("");

    token.as_bytes().ct_eq(expected.as_bytes()).into()
}
