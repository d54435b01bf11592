use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::GeminiConfig;
use crate::error::AnalysisError;
use crate::models::*;

/// Sends a prompt to a generative-text service and returns its raw answer.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze(&self, prompt: &str) -> Result<String, AnalysisError>;
}

pub struct GeminiService {
    client: Client,
    config: GeminiConfig,
}

impl GeminiService {
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            }),
        }
    }
}

/// Joins the text parts of the first candidate.
fn first_candidate_text(response: GeminiResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[async_trait]
impl TextAnalyzer for GeminiService {
    async fn analyze(&self, prompt: &str) -> Result<String, AnalysisError> {
        let url = self.endpoint();
        log::debug!("Gemini request to {} ({} prompt chars)", url, prompt.len());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
                return Err(AnalysisError::Quota(body));
            }
            return Err(AnalysisError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let gemini_response: GeminiResponse =
            serde_json::from_str(&body).map_err(|e| AnalysisError::Decode(e.to_string()))?;

        let answer = first_candidate_text(gemini_response).ok_or(AnalysisError::EmptyResponse)?;
        log::info!("Gemini returned {} chars", answer.len());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> GeminiConfig {
        GeminiConfig {
            api_key: "secret".to_string(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "http://localhost:9/".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
        }
    }

    #[test]
    fn request_body_uses_camel_case_generation_config() {
        let service = GeminiService::new(Client::new(), config());
        let body = serde_json::to_value(service.build_request("hello")).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body.get("generation_config").is_none());
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let service = GeminiService::new(Client::new(), config());
        assert_eq!(
            service.endpoint(),
            "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn candidate_parts_are_concatenated() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Module 1\n" }, { "text": "YOUTUBE_QUERIES:\nq" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(first_candidate_text(response).unwrap(), "Module 1\nYOUTUBE_QUERIES:\nq");
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert!(first_candidate_text(response).is_none());

        let response: GeminiResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert!(first_candidate_text(response).is_none());
    }
}
