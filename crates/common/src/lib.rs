pub mod config;
pub mod error;
pub mod logger;
pub mod restaurant;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::MatjipError;
pub use restaurant::{assemble_catalog, Restaurant, RestaurantProfile, SearchResult};
pub type Result<T> = std::result::Result<T, MatjipError>;
