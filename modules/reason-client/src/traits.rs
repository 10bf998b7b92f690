use anyhow::Result;
use async_trait::async_trait;

/// Boundary to the external generative reasoning service.
///
/// Two request shapes: free-text completion (query rewriting, answer
/// synthesis) and schema-constrained JSON completion (time extraction,
/// reranking). Implementations must be shareable across concurrent
/// pipeline instances.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Free-text completion: system prompt + user prompt, raw text back.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// JSON completion constrained by `schema`. Returns the raw JSON text;
    /// callers deserialize and validate at their own boundary.
    async fn complete_structured(
        &self,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<String>;
}

/// Boundary to the embedding model.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
