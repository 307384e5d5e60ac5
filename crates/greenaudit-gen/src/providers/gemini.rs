use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::error::ProviderError;
use crate::traits::GenerativeProvider;
use crate::types::{GenerateRequest, GenerateResponse};

#[derive(Clone)]
pub struct GeminiGenerativeProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiGenerativeProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        )
    }
}

#[async_trait::async_trait]
impl GenerativeProvider for GeminiGenerativeProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, ProviderError> {
        if request.prompt.trim().is_empty() {
            return Err(ProviderError::Config("prompt is empty".to_string()));
        }

        let payload = GeminiGenerateRequest {
            contents: vec![Content::from_text(&request.prompt)],
            system_instruction: request.system_instruction.as_deref().map(Content::from_text),
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let res = self
            .client
            .post(self.generate_content_url())
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: GeminiGenerateResponse = res.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "no candidate text in response".to_string(),
            ));
        }

        Ok(GenerateResponse {
            provider: self.name().to_string(),
            model: self.config.model.clone(),
            text,
            usage_tokens: parsed.usage_metadata.and_then(|u| u.total_token_count),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

impl Content {
    fn from_text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;

    #[test]
    fn url_carries_model_and_key() {
        let provider = GeminiGenerativeProvider::new(GeminiConfig::new("k-123", "gemini-2.5-flash"))
            .expect("build provider");
        assert_eq!(
            provider.generate_content_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=k-123"
        );
    }

    #[test]
    fn response_parts_concatenate() {
        let raw = r###"{
            "candidates": [
                {"content": {"parts": [{"text": "Score: 78/100\n"}, {"text": "## Summary"}]}}
            ],
            "usageMetadata": {"totalTokenCount": 321}
        }"###;
        let parsed: GeminiGenerateResponse = serde_json::from_str(raw).expect("parse response");
        let candidate = parsed.candidates.into_iter().next().expect("candidate");
        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");
        assert_eq!(text, "Score: 78/100\n## Summary");
        assert_eq!(
            parsed.usage_metadata.and_then(|u| u.total_token_count),
            Some(321)
        );
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_any_request() {
        let provider = GeminiGenerativeProvider::new(GeminiConfig::new("k", "gemini-2.5-flash"))
            .expect("build provider");
        let err = provider
            .generate(GenerateRequest::new("   "))
            .await
            .expect_err("blank prompt should fail");
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn request_payload_uses_camel_case_wire_names() {
        let payload = GeminiGenerateRequest {
            contents: vec![Content::from_text("hello")],
            system_instruction: Some(Content::from_text("be brief")),
            generation_config: Some(GenerationConfig { temperature: 0.4 }),
        };
        let value = serde_json::to_value(&payload).expect("serialize payload");
        assert!(value.get("systemInstruction").is_some());
        assert!(value.get("generationConfig").is_some());
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }
}
