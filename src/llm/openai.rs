//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）。模型与温度按请求传入，
//! 三个角色共用一个客户端。错误体里带 `param` 的参数拒绝映射为 UnsupportedOption。

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{ChatMessage, ChatRole, GenerationOption, GenerationRequest, LlmClient, LlmError};

/// 后端以这些 code 拒绝某个请求参数
const UNSUPPORTED_CODES: [&str; 2] = ["unsupported_value", "unsupported_parameter"];

/// OpenAI 兼容客户端
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, api_key: &str, timeout_secs: u64) -> Self {
        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            timeout_secs,
        }
    }

    fn to_openai_messages(
        messages: &[ChatMessage],
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        messages
            .iter()
            .map(|m| {
                Ok(match m.role {
                    ChatRole::System => ChatCompletionRequestMessage::System(
                        ChatCompletionRequestSystemMessageArgs::default()
                            .content(m.content.clone())
                            .build()?,
                    ),
                    ChatRole::User => ChatCompletionRequestMessage::User(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(m.content.clone())
                            .build()?,
                    ),
                    ChatRole::Assistant => ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .content(m.content.clone())
                            .build()?,
                    ),
                })
            })
            .collect()
    }
}

/// 结构化识别参数拒绝：看错误体的 code 与 param 字段，不匹配 message 文本
fn map_error(err: OpenAIError) -> LlmError {
    if let OpenAIError::ApiError(api) = &err {
        let rejected = api
            .code
            .as_deref()
            .is_some_and(|code| UNSUPPORTED_CODES.contains(&code));
        if rejected {
            if let Some(option) = api.param.as_deref().and_then(GenerationOption::from_param) {
                return LlmError::UnsupportedOption { option };
            }
        }
    }
    LlmError::Api(err.to_string())
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
        let messages = Self::to_openai_messages(request.messages).map_err(map_error)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(request.options.model.as_str()).messages(messages);
        if let Some(temperature) = request.options.temperature {
            args.temperature(temperature);
        }
        let body = args.build().map_err(map_error)?;

        let chat = self.client.chat();
        let call = chat.create(body);
        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), call)
            .await
            .map_err(|_| LlmError::Timeout(self.timeout_secs))?
            .map_err(map_error)?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                role = %request.role,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion usage"
            );
        }

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use async_openai::error::ApiError;

    use super::*;

    fn api_error(code: Option<&str>, param: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "rejected".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: param.map(str::to_string),
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn test_unsupported_temperature_detected() {
        for code in UNSUPPORTED_CODES {
            assert_eq!(
                map_error(api_error(Some(code), Some("temperature"))),
                LlmError::UnsupportedOption {
                    option: GenerationOption::Temperature
                }
            );
        }
    }

    #[test]
    fn test_other_api_errors_stay_generic() {
        // 不认识的参数、无 param、其他 code 都不协商
        assert!(matches!(
            map_error(api_error(Some("unsupported_value"), Some("top_p"))),
            LlmError::Api(_)
        ));
        assert!(matches!(
            map_error(api_error(Some("unsupported_parameter"), None)),
            LlmError::Api(_)
        ));
        assert!(matches!(
            map_error(api_error(Some("rate_limit_exceeded"), Some("temperature"))),
            LlmError::Api(_)
        ));
    }
}
