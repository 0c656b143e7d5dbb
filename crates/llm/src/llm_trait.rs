use crate::types::GenerateRequest;
use async_trait::async_trait;
use matjip_common::Result;

/// Common trait for LLM clients
///
/// The index engine only needs the embedding half; the recommender only needs `generate`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate text from a prompt
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Generate embedding for text
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for several texts, one row per text in input order
    async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut rows = Vec::with_capacity(texts.len());
        for text in texts {
            rows.push(self.embed(model, text).await?);
        }
        Ok(rows)
    }

    /// Test connection/availability
    async fn test_connection(&self) -> Result<bool>;
}
