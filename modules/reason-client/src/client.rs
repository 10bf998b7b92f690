use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::schema::StructuredOutput;
use crate::traits::{ReasoningService, TextEmbedder};
use crate::types::*;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible reasoning service: chat completion,
/// schema-constrained JSON completion, and embeddings.
#[derive(Clone)]
pub struct Reasoner {
    api_key: String,
    model: String,
    embedding_model: String,
    base_url: String,
    http: reqwest::Client,
}

impl Reasoner {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: "text-embedding-3-large".to_string(),
            base_url: DEFAULT_API_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, "reasoning service chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!(
                "reasoning service error ({}): {}",
                status,
                error_text
            ));
        }

        Ok(response.json().await?)
    }

    /// Type-safe structured output extraction.
    pub async fn extract<T: StructuredOutput>(
        &self,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let json_str = self
            .structured_completion(
                &system_prompt.into(),
                &user_prompt.into(),
                T::response_schema(),
            )
            .await?;

        serde_json::from_str(&json_str)
            .map_err(|e| anyhow!("failed to deserialize structured response: {}", e))
    }

    async fn structured_completion(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![WireMessage::system(system), WireMessage::user(user)],
            temperature: Some(0.0),
            max_tokens: None,
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: "structured_response".to_string(),
                    strict: true,
                    schema,
                },
            }),
        };

        let response = self.chat(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("no content in reasoning service response"))
    }

    /// Simple text completion with a system prompt.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage::system(system.into()),
                WireMessage::user(user.into()),
            ],
            temperature: Some(0.0),
            max_tokens: Some(4096),
            response_format: None,
        };

        let response = self.chat(&request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("no content in reasoning service response"))
    }

    /// Create an embedding for one text.
    pub async fn create_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: text.to_string(),
        };

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("embedding error ({}): {}", status, error_text));
        }

        let embed_response: EmbeddingResponse = response.json().await?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow!("no embedding in response"))
    }
}

#[async_trait]
impl ReasoningService for Reasoner {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat_completion(system, user).await
    }

    async fn complete_structured(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<String> {
        self.structured_completion(system, user, schema).await
    }
}

#[async_trait]
impl TextEmbedder for Reasoner {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.create_embedding(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoner_defaults() {
        let r = Reasoner::new("sk-test", "gpt-4o");
        assert_eq!(r.model(), "gpt-4o");
        assert_eq!(r.embedding_model, "text-embedding-3-large");
        assert_eq!(r.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn reasoner_overrides() {
        let r = Reasoner::new("sk-test", "gpt-4o")
            .with_embedding_model("text-embedding-3-small")
            .with_base_url("https://proxy.internal/v1");
        assert_eq!(r.embedding_model, "text-embedding-3-small");
        assert_eq!(r.base_url, "https://proxy.internal/v1");
    }
}
