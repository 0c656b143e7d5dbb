use serde::{Deserialize, Serialize};

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "qwen2.5:1.5b", "gemma2")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// System message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Disable streaming
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Generation options
#[derive(Debug, Clone, Serialize, Default)]
pub struct GenerateOptions {
    /// Temperature (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

/// Ollama generate response
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Model name
    pub model: String,

    /// Generated text
    pub response: String,

    /// Whether generation is complete
    pub done: bool,
}

/// Embedding request (`/api/embed`); single texts are sent as a one-element batch
#[derive(Debug, Clone, Serialize)]
pub struct EmbedBatchRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// Batch embedding response, one row per input in request order
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedBatchResponse {
    pub embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_skips_unset_fields() {
        let request = GenerateRequest {
            model: "qwen2.5:1.5b".to_string(),
            prompt: "hi".to_string(),
            system: None,
            stream: Some(false),
            options: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("system").is_none());
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_batch_response_parses() {
        let response: EmbedBatchResponse = serde_json::from_str(
            r#"{"model": "bge-m3", "embeddings": [[0.1, 0.2], [0.3, 0.4]]}"#,
        )
        .unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(response.embeddings[1], vec![0.3, 0.4]);
    }
}
