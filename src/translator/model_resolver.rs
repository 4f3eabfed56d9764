//! 模型解析
//!
//! 优先级：静态映射 > `provider/model` > `provider:model` > 配置的默认组合 > 不指定。

use crate::config::ModelMapping;
use crate::models::opencode::ModelRef;

/// 模型解析器
#[derive(Debug, Clone, Default)]
pub struct ModelResolver {
    mapping: ModelMapping,
    default_model: Option<ModelRef>,
}

impl ModelResolver {
    pub fn new(mapping: ModelMapping, default_model: Option<ModelRef>) -> Self {
        Self {
            mapping,
            default_model,
        }
    }

    /// 解析请求中的模型名
    ///
    /// 返回 `None` 时不向 opencode 传 `model`，由上游使用自己的默认模型。
    pub fn resolve(&self, requested: Option<&str>) -> Option<ModelRef> {
        if let Some(model) = requested.filter(|m| !m.is_empty()) {
            if let Some(mapped) = self.mapping.get(model) {
                return Some(mapped.clone());
            }
            if let Some(split) = split_model(model, '/').or_else(|| split_model(model, ':')) {
                return Some(split);
            }
        }

        self.default_model.clone()
    }
}

/// 按第一个分隔符拆分，两侧都非空才算有效
fn split_model(model: &str, separator: char) -> Option<ModelRef> {
    let (provider, rest) = model.split_once(separator)?;
    if provider.is_empty() || rest.is_empty() {
        return None;
    }
    Some(ModelRef::new(provider, rest))
}
