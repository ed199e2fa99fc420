//! Solution generator backed by an OpenAI-compatible chat completions API

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat, SolutionPayload,
};

const SYSTEM_PROMPT: &str = "You are an expert competitive programmer who writes concise \
revision notes for LeetCode problems. Reply with a single JSON object and nothing else.";

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Solution generator is not configured")]
    NotConfigured,
    #[error("Generator request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse generator response: {0}")]
    ParseError(String),
}

/// Produces a structured analysis for a question on a cache miss
#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    async fn generate(
        &self,
        question_name: &str,
        language: &str,
    ) -> Result<SolutionPayload, GeneratorError>;
}

pub struct LlmSolutionGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmSolutionGenerator {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SolutionGenerator for LlmSolutionGenerator {
    async fn generate(
        &self,
        question_name: &str,
        language: &str,
    ) -> Result<SolutionPayload, GeneratorError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GeneratorError::NotConfigured)?;

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(question_name, language),
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        tracing::info!("Generating solution for {:?} in {}", question_name, language);

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::RequestFailed(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GeneratorError::ParseError("Response has no choices".into()))?;

        parse_payload(&content)
    }
}

fn build_prompt(question_name: &str, language: &str) -> String {
    format!(
        "Write revision notes for the LeetCode problem \"{question_name}\" in {language}.\n\
         Return JSON with this shape:\n\
         {{\"summary\": string, \"approaches\": [{{\"name\": string, \"explanation\": string, \
         \"timeComplexity\": string, \"spaceComplexity\": string, \"code\": string}}], \
         \"insights\": [string], \"pitfalls\": [string]}}\n\
         Order approaches from brute force to optimal."
    )
}

/// Parse the model's reply, tolerating a surrounding markdown code fence
pub fn parse_payload(content: &str) -> Result<SolutionPayload, GeneratorError> {
    let trimmed = content.trim();
    let body = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches("json");
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    };

    let payload: SolutionPayload =
        serde_json::from_str(body).map_err(|e| GeneratorError::ParseError(e.to_string()))?;

    if payload.approaches.is_empty() {
        return Err(GeneratorError::ParseError(
            "Solution has no approaches".into(),
        ));
    }

    Ok(payload)
}
