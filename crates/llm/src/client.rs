use async_trait::async_trait;
use matjip_common::{MatjipError, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::llm_trait::LlmClient;
use crate::types::{EmbedBatchRequest, EmbedBatchResponse, GenerateRequest, GenerateResponse};

const MAX_RETRIES: u32 = 3;

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 minutes for LLM calls
            .build()
            .map_err(|e| MatjipError::llm(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Run `attempt` up to MAX_RETRIES times with exponential backoff
    async fn with_retry<T, F, Fut>(&self, label: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for n in 1..=MAX_RETRIES {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if n < MAX_RETRIES {
                        let delay = std::time::Duration::from_secs(2u64.pow(n - 1));
                        warn!(
                            "{} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            label, n, MAX_RETRIES, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MatjipError::llm(format!("{}: all retries failed", label))))
    }

    /// Single POST returning a parsed JSON body
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| MatjipError::llm(format!("Failed to send request to {}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| MatjipError::llm(format!("Ollama API error: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| MatjipError::llm(format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let mut request = request;
        request.stream = Some(false);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let request = &request;
        self.with_retry("Generate", || async move {
            let result: GenerateResponse = self.post_json("/api/generate", request).await?;
            if result.response.trim().is_empty() {
                return Err(MatjipError::llm("Empty response from Ollama"));
            }
            debug!("Received response from {} - Length: {}", result.model, result.response.len());
            Ok(result.response)
        })
        .await
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        // Same endpoint as batches so query and record vectors are comparable
        let rows = self.embed_batch(model, &[text.to_string()]).await?;
        match rows.into_iter().next() {
            Some(embedding) if !embedding.is_empty() => Ok(embedding),
            _ => Err(MatjipError::llm("Empty embedding from Ollama")),
        }
    }

    async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("Generating {} embeddings - Model: {}", texts.len(), model);

        let request = EmbedBatchRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let request = &request;
        self.with_retry("Batch embedding", || async move {
            let result: EmbedBatchResponse = self.post_json("/api/embed", request).await?;
            if result.embeddings.len() != texts.len() {
                return Err(MatjipError::llm(format!(
                    "Ollama returned {} embeddings for {} inputs",
                    result.embeddings.len(),
                    texts.len()
                )));
            }
            Ok(result.embeddings)
        })
        .await
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MatjipError::llm(format!("Failed to connect to Ollama: {}", e)))?;
        Ok(response.status().is_success())
    }
}
