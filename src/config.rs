//! 配置
//!
//! 进程启动时从环境变量读取一次，之后以 `Arc<BridgeConfig>` 只读共享。
//! 请求处理逻辑不再访问环境变量。

use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;

use crate::models::opencode::ModelRef;

/// 默认对外模型 ID
pub const DEFAULT_MODEL_ID: &str = "opencode-local";
/// 默认 opencode 地址
pub const DEFAULT_OPENCODE_BASE_URL: &str = "http://127.0.0.1:4096";

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("环境变量 {key} 不是有效数字: {value}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("无效的 MODEL_MAP_JSON: {0}")]
    InvalidModelMap(String),

    #[error("无效的 OPENCODE_BASE_URL: {0}")]
    InvalidBaseUrl(String),

    #[error("无效的监听地址: {0}")]
    InvalidListenAddr(String),
}

/// opencode 认证方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamAuth {
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl UpstreamAuth {
    /// 生成 Authorization 头的值
    pub fn header_value(&self) -> Option<String> {
        use base64::Engine;

        match self {
            UpstreamAuth::None => None,
            UpstreamAuth::Basic { username, password } => {
                let raw = format!("{username}:{password}");
                Some(format!(
                    "Basic {}",
                    base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
                ))
            }
            UpstreamAuth::Bearer { token } => Some(format!("Bearer {token}")),
        }
    }

    fn from_parts(mode: &str, username: String, password: String) -> Self {
        if password.is_empty() {
            return UpstreamAuth::None;
        }
        match mode.to_lowercase().as_str() {
            "basic" => UpstreamAuth::Basic { username, password },
            "bearer" => UpstreamAuth::Bearer { token: password },
            _ => UpstreamAuth::None,
        }
    }
}

/// 对外模型 ID 到上游 provider/model 的静态映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelMapping {
    entries: HashMap<String, ModelRef>,
}

impl ModelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 `{"alias": {"providerID": "...", "modelID": "..."}}` 形式的 JSON
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let entries: HashMap<String, ModelRef> =
            serde_json::from_str(raw).map_err(|e| ConfigError::InvalidModelMap(e.to_string()))?;
        Ok(Self { entries })
    }

    pub fn insert(&mut self, alias: impl Into<String>, target: ModelRef) {
        self.entries.insert(alias.into(), target);
    }

    pub fn get(&self, alias: &str) -> Option<&ModelRef> {
        self.entries.get(alias)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 超时配置（毫秒，0 表示不限时）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    pub session_ms: u64,
    pub message_ms: u64,
}

/// 重试配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// 额外重试次数，总尝试次数为 `retry_count + 1`
    pub retry_count: u32,
    pub delay_ms: u64,
}

/// 桥接服务完整配置
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// 对外共享密钥，为空时跳过认证
    pub api_key: Option<String>,
    /// `/v1/models` 中公布的模型 ID
    pub model_id: String,
    pub opencode_base_url: String,
    pub upstream_auth: UpstreamAuth,
    pub directory: Option<String>,
    pub default_model: Option<ModelRef>,
    pub default_agent: Option<String>,
    pub default_system: Option<String>,
    pub timeouts: UpstreamTimeouts,
    pub retry: RetrySettings,
    pub model_map: ModelMapping,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            api_key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            opencode_base_url: DEFAULT_OPENCODE_BASE_URL.to_string(),
            upstream_auth: UpstreamAuth::None,
            directory: None,
            default_model: None,
            default_agent: None,
            default_system: None,
            timeouts: UpstreamTimeouts {
                session_ms: 15_000,
                message_ms: 60_000,
            },
            retry: RetrySettings {
                retry_count: 1,
                delay_ms: 750,
            },
            model_map: ModelMapping::new(),
        }
    }
}

impl BridgeConfig {
    /// 从进程环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载，空字符串与未设置等价
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let base_url = get("OPENCODE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENCODE_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let password = get("OPENCODE_AUTH_PASSWORD")
            .or_else(|| get("OPENCODE_SERVER_PASSWORD"))
            .unwrap_or_default();
        let upstream_auth = UpstreamAuth::from_parts(
            &get("OPENCODE_AUTH_MODE").unwrap_or_else(|| "basic".to_string()),
            get("OPENCODE_AUTH_USERNAME").unwrap_or_else(|| "opencode".to_string()),
            password,
        );

        let default_model = match (get("OPENCODE_PROVIDER_ID"), get("OPENCODE_MODEL_ID")) {
            (Some(provider), Some(model)) => Some(ModelRef::new(provider, model)),
            _ => None,
        };

        let model_map = match get("MODEL_MAP_JSON") {
            Some(raw) => ModelMapping::from_json(&raw)?,
            None => ModelMapping::new(),
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_number(&get, "PORT", defaults.port)?,
            api_key: get("BRIDGE_API_KEY"),
            model_id: get("OPENAI_MODEL_ID").unwrap_or(defaults.model_id),
            opencode_base_url: base_url,
            upstream_auth,
            directory: get("OPENCODE_DIRECTORY"),
            default_model,
            default_agent: get("OPENCODE_AGENT"),
            default_system: get("OPENCODE_SYSTEM"),
            timeouts: UpstreamTimeouts {
                session_ms: parse_number(
                    &get,
                    "OPENCODE_SESSION_TIMEOUT_MS",
                    defaults.timeouts.session_ms,
                )?,
                message_ms: parse_number(
                    &get,
                    "OPENCODE_MESSAGE_TIMEOUT_MS",
                    defaults.timeouts.message_ms,
                )?,
            },
            retry: RetrySettings {
                retry_count: parse_number(&get, "OPENCODE_RETRY_COUNT", defaults.retry.retry_count)?,
                delay_ms: parse_number(&get, "OPENCODE_RETRY_DELAY_MS", defaults.retry.delay_ms)?,
            },
            model_map,
        })
    }

    /// 监听地址，`HOST` 可以是主机名
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = || ConfigError::InvalidListenAddr(format!("{}:{}", self.host, self.port));
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)
    }

    /// 总尝试次数，至少为 1
    pub fn max_attempts(&self) -> u32 {
        self.retry.retry_count.saturating_add(1).max(1)
    }
}

fn parse_number<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}
