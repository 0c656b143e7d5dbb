//! Restaurant records shared by the index engine and the recommenders

use crate::error::MatjipError;
use serde::{Deserialize, Serialize};

/// Review text kept in the search blob, in characters
pub const REVIEW_EXCERPT_CHARS: usize = 500;

/// Tag text kept in the search blob, in characters
pub const TAG_EXCERPT_CHARS: usize = 200;

/// Highest rating a restaurant can carry
pub const MAX_RATING: f32 = 5.0;

/// Restaurant attributes as produced by the review preprocessing step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestaurantProfile {
    pub name: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub menu_type: String,

    #[serde(default)]
    pub atmosphere: String,

    #[serde(default)]
    pub price_range: String,

    #[serde(default)]
    pub rating: f32,

    #[serde(default)]
    pub review_count: u32,

    #[serde(default)]
    pub avg_visits: f32,

    /// Raw review bodies
    #[serde(default)]
    pub reviews: Vec<String>,

    /// Review tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Indexed restaurant record
///
/// Immutable once assembled; the index engine joins it to its vector by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Positive identifier assigned at ingestion
    pub id: u32,

    pub name: String,
    pub location: String,
    pub menu_type: String,
    pub atmosphere: String,
    pub price_range: String,

    /// Rating in [0, 5]
    pub rating: f32,

    pub review_count: u32,
    pub avg_visits: f32,

    /// Text that gets embedded
    pub search_text: String,

    /// One-line human summary
    pub summary: String,
}

impl Restaurant {
    /// Assemble a record from a profile, composing the search blob and summary
    pub fn from_profile(id: u32, profile: RestaurantProfile) -> Result<Self, MatjipError> {
        let all_reviews = profile.reviews.join(" ");
        let all_tags = profile.tags.join(" ");
        let reviews = truncate_chars(&all_reviews, REVIEW_EXCERPT_CHARS);
        let tags = truncate_chars(&all_tags, TAG_EXCERPT_CHARS);

        let search_text = format!(
            "식당명: {}\n위치: {}\n메뉴: {}\n분위기: {}\n가격대: {}\n리뷰요약: {}\n태그: {}",
            profile.name,
            profile.location,
            profile.menu_type,
            profile.atmosphere,
            profile.price_range,
            reviews,
            tags
        );

        let summary = format!(
            "{}의 {} 전문점. {} 장소로 인기.",
            profile.location, profile.menu_type, profile.atmosphere
        );

        let restaurant = Self {
            id,
            name: profile.name,
            location: profile.location,
            menu_type: profile.menu_type,
            atmosphere: profile.atmosphere,
            price_range: profile.price_range,
            rating: profile.rating,
            review_count: profile.review_count,
            avg_visits: profile.avg_visits,
            search_text,
            summary,
        };

        restaurant.validate()?;
        Ok(restaurant)
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<(), MatjipError> {
        if self.id == 0 {
            return Err(MatjipError::invalid_input(format!(
                "Restaurant '{}' has id 0; ids must be positive",
                self.name
            )));
        }

        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(MatjipError::invalid_input(format!(
                "Restaurant {} rating {} is outside [0, {}]",
                self.id, self.rating, MAX_RATING
            )));
        }

        if self.search_text.trim().is_empty() {
            return Err(MatjipError::invalid_input(format!(
                "Restaurant {} has an empty search text",
                self.id
            )));
        }

        Ok(())
    }
}

/// Turn preprocessed profiles into records, assigning ids 1..=n in input order
pub fn assemble_catalog(profiles: Vec<RestaurantProfile>) -> Result<Vec<Restaurant>, MatjipError> {
    profiles
        .into_iter()
        .enumerate()
        .map(|(idx, profile)| {
            let id = u32::try_from(idx + 1)
                .map_err(|_| MatjipError::invalid_input("Too many restaurants for u32 ids"))?;
            Restaurant::from_profile(id, profile)
        })
        .collect()
}

/// A record paired with its similarity to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub restaurant: Restaurant,

    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

impl SearchResult {
    pub fn new(restaurant: Restaurant, score: f32) -> Self {
        Self { restaurant, score }
    }
}

/// Truncate to at most `max_chars` characters, never splitting a code point
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
