//! OpenAI 请求转换为 opencode 发送消息请求体

use crate::config::BridgeConfig;
use crate::models::openai::ChatCompletionRequest;
use crate::models::opencode::{PromptBody, PromptPart};
use crate::processor::BridgeError;
use crate::translator::model_resolver::ModelResolver;
use crate::translator::prompt::{build_prompt, merge_system};
use crate::translator::traits::RequestTranslator;

/// OpenAI 到 opencode 请求转换器
#[derive(Debug, Clone, Default)]
pub struct OpencodeRequestTranslator {
    resolver: ModelResolver,
    default_agent: Option<String>,
    default_system: Option<String>,
}

impl OpencodeRequestTranslator {
    pub fn new(
        resolver: ModelResolver,
        default_agent: Option<String>,
        default_system: Option<String>,
    ) -> Self {
        Self {
            resolver,
            default_agent,
            default_system,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            ModelResolver::new(config.model_map.clone(), config.default_model.clone()),
            config.default_agent.clone(),
            config.default_system.clone(),
        )
    }
}

impl RequestTranslator for OpencodeRequestTranslator {
    type Input = ChatCompletionRequest;
    type Output = PromptBody;
    type Error = BridgeError;

    /// 校验并转换请求，失败时不会产生任何上游调用
    fn translate_request(&self, request: &ChatCompletionRequest) -> Result<PromptBody, BridgeError> {
        if request.messages.is_empty() {
            return Err(BridgeError::Validation("messages is required".to_string()));
        }

        let prompt = build_prompt(&request.messages);
        if !prompt.is_usable() {
            return Err(BridgeError::Validation(
                "No usable text found in messages".to_string(),
            ));
        }

        Ok(PromptBody {
            model: self.resolver.resolve(request.requested_model()),
            agent: self.default_agent.clone().filter(|a| !a.is_empty()),
            system: merge_system(self.default_system.as_deref(), prompt.system()),
            parts: vec![PromptPart::text(prompt.prompt)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelMapping;
    use crate::models::opencode::ModelRef;

    fn request(value: serde_json::Value) -> ChatCompletionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_messages_rejected() {
        let translator = OpencodeRequestTranslator::default();
        let err = translator
            .translate_request(&request(serde_json::json!({})))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation(ref m) if m == "messages is required"));
    }

    #[test]
    fn test_unusable_prompt_rejected() {
        let translator = OpencodeRequestTranslator::default();
        let err = translator
            .translate_request(&request(serde_json::json!({
                "messages": [{"role": "system", "content": "only system"}]
            })))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation(ref m) if m == "No usable text found in messages"));
    }

    #[test]
    fn test_minimal_body() {
        let translator = OpencodeRequestTranslator::default();
        let body = translator
            .translate_request(&request(serde_json::json!({
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .unwrap();
        assert_eq!(body.parts, vec![PromptPart::text("USER:\nHi")]);
        assert_eq!(body.model, None);
        assert_eq!(body.agent, None);
        assert_eq!(body.system, None);
    }

    #[test]
    fn test_full_body() {
        let mut mapping = ModelMapping::new();
        mapping.insert("gpt-x", ModelRef::new("p", "m"));
        let translator = OpencodeRequestTranslator::new(
            ModelResolver::new(mapping, None),
            Some("build".to_string()),
            Some("You are a bridge.".to_string()),
        );

        let body = translator
            .translate_request(&request(serde_json::json!({
                "model": "gpt-x",
                "messages": [
                    {"role": "system", "content": "Be concise"},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .unwrap();

        assert_eq!(body.model, Some(ModelRef::new("p", "m")));
        assert_eq!(body.agent.as_deref(), Some("build"));
        assert_eq!(body.system.as_deref(), Some("You are a bridge.\n\nBe concise"));
        assert_eq!(body.parts[0].text, "USER:\nHi");
    }
}
