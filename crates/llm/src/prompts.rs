//! Prompt templates for restaurant recommendations

use matjip_common::SearchResult;

/// System message for the recommendation model
pub const SYSTEM_PROMPT: &str = "당신은 친근하고 도움이 되는 한국 맛집 추천 전문가입니다.";

/// Results handed to the model; the rest only appear in the score table
pub const PROMPT_RESULT_LIMIT: usize = 3;

/// Render one result as a prompt block
fn restaurant_block(rank: usize, result: &SearchResult) -> String {
    let r = &result.restaurant;
    format!(
        "{}. **{}**\n   - 위치: {}\n   - 메뉴: {}\n   - 분위기: {}\n   - 가격대: {}\n   - 평점: {}/5.0\n   - 한줄평: {}",
        rank, r.name, r.location, r.menu_type, r.atmosphere, r.price_range, r.rating, r.summary
    )
}

/// Prompt asking the model to recommend the top results for a query
pub fn recommend_prompt(query: &str, results: &[SearchResult]) -> String {
    let restaurants_text = results
        .iter()
        .take(PROMPT_RESULT_LIMIT)
        .enumerate()
        .map(|(i, result)| restaurant_block(i + 1, result))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "사용자 요청: \"{}\"\n\n추천할 식당들:\n{}\n\n위 식당들을 사용자 요청에 맞게 매력적으로 추천해주세요. \
         각 식당의 특별한 점과 추천 이유를 포함해서 자연스럽게 한국어로 설명해주세요. \
         간결하고 친근하게 작성해주세요.",
        query, restaurants_text
    )
}
