use matjip_common::SearchResult;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm_trait::LlmClient;
use crate::prompts::{recommend_prompt, SYSTEM_PROMPT};
use crate::types::{GenerateOptions, GenerateRequest};

/// Returned when a search produced nothing to recommend
pub const NO_RESULTS_MESSAGE: &str = "죄송합니다. 조건에 맞는 식당을 찾지 못했습니다.";

/// Where a recommendation text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationSource {
    Llm,
    Template,
}

/// Prose built from ranked search results
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub text: String,
    pub source: RecommendationSource,
}

impl Recommendation {
    fn template(query: &str, results: &[SearchResult]) -> Self {
        Self {
            text: format_results(query, results),
            source: RecommendationSource::Template,
        }
    }
}

/// Turns ranked results into recommendation text, falling back to a template
pub struct Recommender {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl Recommender {
    /// Create new recommender
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Generate recommendation text with the LLM
    ///
    /// Generation failures never reach the caller; they degrade to `format_results`.
    pub async fn recommend(&self, query: &str, results: &[SearchResult]) -> Recommendation {
        if results.is_empty() {
            return Recommendation::template(query, results);
        }

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: recommend_prompt(query, results),
            system: Some(SYSTEM_PROMPT.to_string()),
            stream: Some(false),
            options: Some(GenerateOptions {
                temperature: Some(0.7),
                top_p: Some(0.9),
                num_predict: Some(1000),
            }),
        };

        match self.client.generate(request).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!("LLM recommendation generated - Length: {}", text.len());
                Recommendation {
                    text: text.trim().to_string(),
                    source: RecommendationSource::Llm,
                }
            }
            Ok(_) => {
                warn!("LLM returned an empty recommendation, using template");
                Recommendation::template(query, results)
            }
            Err(e) => {
                warn!("LLM recommendation failed, using template: {}", e);
                Recommendation::template(query, results)
            }
        }
    }
}

/// Template-based recommendation text
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut out = format!("🔍 '{}' 검색 결과\n", query);

    for (i, result) in results.iter().enumerate() {
        let r = &result.restaurant;
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "\n{}. {} ⭐ {}/5.0\n📍 {} | 💰 {}\n🍽️ {} | 🎭 {}\n📝 {}\n📊 매칭도: {:.1}%\n",
            i + 1,
            r.name,
            r.rating,
            r.location,
            r.price_range,
            r.menu_type,
            r.atmosphere,
            r.summary,
            result.score * 100.0
        );
    }

    out
}
