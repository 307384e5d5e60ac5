use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiCompatibleConfig;
use crate::error::ProviderError;
use crate::traits::GenerativeProvider;
use crate::types::{GenerateRequest, GenerateResponse};

#[derive(Clone)]
pub struct OpenAiCompatibleGenerativeProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleGenerativeProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl GenerativeProvider for OpenAiCompatibleGenerativeProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, ProviderError> {
        if request.prompt.trim().is_empty() {
            return Err(ProviderError::Config("prompt is empty".to_string()));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_instruction {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        let payload = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: request.temperature,
        };

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = res.json().await?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(ProviderError::InvalidResponse(
                "no choices in response".to_string(),
            ));
        };

        Ok(GenerateResponse {
            provider: self.name().to_string(),
            model: parsed.model,
            text: choice.message.content,
            usage_tokens: parsed.usage.and_then(|u| u.total_tokens),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiCompatibleConfig;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let mut cfg = OpenAiCompatibleConfig::new("k", "gpt-4o-mini");
        cfg.base_url = "https://example.test/".to_string();
        let provider = OpenAiCompatibleGenerativeProvider::new(cfg).expect("build provider");
        assert_eq!(provider.endpoint(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn response_reads_first_choice() {
        let raw = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Score: 64/100"}}],
            "usage": {"total_tokens": 128}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).expect("parse response");
        let choice = parsed.choices.into_iter().next().expect("choice");
        assert_eq!(choice.message.content, "Score: 64/100");
        assert_eq!(parsed.usage.and_then(|u| u.total_tokens), Some(128));
    }
}
