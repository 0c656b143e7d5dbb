//! Matjip LLM Integration
//!
//! Ollama API 클라이언트 (임베딩, 텍스트 생성) 및 추천 문구 생성

mod client;
mod llm_trait;
mod prompts;
mod recommend;
mod types;

pub use client::OllamaClient;
pub use llm_trait::LlmClient;
pub use prompts::{recommend_prompt, PROMPT_RESULT_LIMIT, SYSTEM_PROMPT};
pub use recommend::{format_results, Recommendation, RecommendationSource, Recommender, NO_RESULTS_MESSAGE};
pub use types::{
    EmbedBatchRequest, EmbedBatchResponse, GenerateOptions, GenerateRequest, GenerateResponse,
};
