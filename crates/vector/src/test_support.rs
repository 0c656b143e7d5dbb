//! Deterministic encoders for engine tests

use async_trait::async_trait;
use matjip_common::{MatjipError, Restaurant, Result};
use matjip_llm::{GenerateRequest, LlmClient};

/// Keyword groups; each group is one embedding axis
const CONCEPTS: &[&[&str]] = &[
    &["meat", "고기"],
    &["pasta", "파스타"],
    &["noodle", "면"],
    &["romantic", "date", "데이트"],
    &["group", "회식"],
    &["solo", "혼밥"],
    &["casual", "캐주얼"],
    &["dessert", "디저트"],
];

/// Small weight on every axis so no text maps to the zero vector
const BIAS: f32 = 0.1;

/// Maps text onto concept axes by keyword, like a tiny bag-of-concepts model
#[derive(Default)]
pub struct ConceptEncoder;

impl ConceptEncoder {
    pub fn encode(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        CONCEPTS
            .iter()
            .map(|keywords| {
                let hit = keywords.iter().any(|k| lower.contains(k));
                if hit {
                    1.0 + BIAS
                } else {
                    BIAS
                }
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for ConceptEncoder {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        Err(MatjipError::llm("concept encoder does not generate text"))
    }

    async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(MatjipError::llm("empty input"));
        }
        Ok(Self::encode(text))
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Encoder whose model server is down
pub struct FailingEncoder;

#[async_trait]
impl LlmClient for FailingEncoder {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        Err(MatjipError::llm("connection refused"))
    }

    async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
        Err(MatjipError::llm("connection refused"))
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(false)
    }
}

/// Encoder that returns a shorter vector for texts containing "short"
pub struct RaggedEncoder;

#[async_trait]
impl LlmClient for RaggedEncoder {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        Err(MatjipError::llm("not a generator"))
    }

    async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>> {
        let mut vector = ConceptEncoder::encode(text);
        if text.contains("short") {
            vector.truncate(3);
        }
        Ok(vector)
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Encoder whose single-text and batch calls disagree, like two server endpoints
pub struct SplitEndpointEncoder;

#[async_trait]
impl LlmClient for SplitEndpointEncoder {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        Err(MatjipError::llm("not a generator"))
    }

    async fn embed(&self, _model: &str, text: &str) -> Result<Vec<f32>> {
        let mut vector = ConceptEncoder::encode(text);
        vector.reverse();
        Ok(vector)
    }

    async fn embed_batch(&self, _model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| ConceptEncoder::encode(t)).collect())
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Record whose search text is exactly `text`
pub fn restaurant(id: u32, name: &str, text: &str) -> Restaurant {
    Restaurant {
        id,
        name: name.to_string(),
        location: "건대".to_string(),
        menu_type: String::new(),
        atmosphere: String::new(),
        price_range: String::new(),
        rating: 4.0,
        review_count: 10,
        avg_visits: 1.0,
        search_text: text.to_string(),
        summary: format!("{} 한줄평", name),
    }
}
