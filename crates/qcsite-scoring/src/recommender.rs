//! Turns a [`SuitabilityResult`] into recommendation text.
//!
//! [`HeuristicRecommender`] is deterministic and always available.
//! [`LlmRecommender`] asks a chat-completions endpoint for a short analyst
//! note and falls back to the heuristic text whenever that call fails.

use std::time::Duration;

use async_trait::async_trait;
use qcsite_core::{LlmConfig, Location};
use serde::{Deserialize, Serialize};

use crate::error::RecommenderError;
use crate::types::SuitabilityResult;

const LLM_TEMPERATURE: f32 = 0.2;
const LLM_TIMEOUT_SECS: u64 = 15;

/// Produces display text for a scored location. Infallible: implementations
/// that call out must degrade to a deterministic answer.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn describe(&self, location: &Location, result: &SuitabilityResult) -> String;

    /// Upper bound on one `describe` call. Zero for implementations that
    /// never leave the process.
    fn max_latency(&self) -> Duration {
        Duration::ZERO
    }
}

/// Returns the canonical tier text for the result's score.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRecommender;

#[async_trait]
impl Recommender for HeuristicRecommender {
    async fn describe(&self, _location: &Location, result: &SuitabilityResult) -> String {
        result.recommendation_tier.summary().to_string()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions backed recommender.
pub struct LlmRecommender {
    client: reqwest::Client,
    config: LlmConfig,
    fallback: HeuristicRecommender,
}

impl LlmRecommender {
    /// # Errors
    ///
    /// Returns [`RecommenderError::Http`] if the HTTP client cannot be built.
    pub fn new(config: LlmConfig) -> Result<Self, RecommenderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            config,
            fallback: HeuristicRecommender,
        })
    }

    fn prompt(location: &Location, result: &SuitabilityResult) -> String {
        let analysis = serde_json::json!({
            "location": location.name,
            "city": location.city,
            "state": location.state,
            "analysis": result,
        });
        format!(
            "You are an expert supply-chain analyst. Based on the following JSON analysis of a \
             city, provide a concise (max 80 words) recommendation on whether the operator \
             should open a warehouse there and why. Always start with \"Recommendation:\" then \
             a short justification.\n\nAnalysis:\n{analysis:#}"
        )
    }

    /// Sends one chat-completions request and returns the trimmed answer.
    ///
    /// # Errors
    ///
    /// Returns [`RecommenderError`] on transport failure, a non-2xx status,
    /// or a response without text.
    pub async fn complete(
        &self,
        location: &Location,
        result: &SuitabilityResult,
    ) -> Result<String, RecommenderError> {
        let prompt = Self::prompt(location, result);
        let request = ChatRequest {
            model: &self.config.model,
            temperature: LLM_TEMPERATURE,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommenderError::UnexpectedStatus(status.as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(RecommenderError::EmptyResponse)
    }
}

#[async_trait]
impl Recommender for LlmRecommender {
    async fn describe(&self, location: &Location, result: &SuitabilityResult) -> String {
        match self.complete(location, result).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    location = %location.name,
                    error = %e,
                    "LLM recommendation failed; using heuristic text"
                );
                self.fallback.describe(location, result).await
            }
        }
    }

    fn max_latency(&self) -> Duration {
        Duration::from_secs(LLM_TIMEOUT_SECS)
    }
}

#[cfg(test)]
#[path = "recommender_test.rs"]
mod tests;
