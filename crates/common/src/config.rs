use crate::error::MatjipError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Matjip application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Restaurant profile JSON produced by the preprocessing step
    pub data_path: PathBuf,

    /// Snapshot directory (index, records, raw embeddings)
    pub index_dir: PathBuf,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Recommendation text model name
    pub llm_model: String,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Number of results returned when the caller does not ask for a count
    pub default_top_k: usize,

    /// Texts per embedding request during index build
    pub embed_batch_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("./data/restaurants.json"),
            index_dir: PathBuf::from("./models/restaurant_index"),
            ollama_base_url: "http://localhost:11434".to_string(),
            embedding_model: "bge-m3".to_string(),
            llm_model: "qwen2.5:1.5b".to_string(),
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
            default_top_k: 3,
            embed_batch_size: 32,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, MatjipError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            data_path: Self::get_env_path("DATA_PATH").unwrap_or(defaults.data_path),
            index_dir: Self::get_env_path("INDEX_DIR").unwrap_or(defaults.index_dir),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            default_top_k: Self::get_env_usize("DEFAULT_TOP_K")?
                .unwrap_or(defaults.default_top_k),
            embed_batch_size: Self::get_env_usize("EMBED_BATCH_SIZE")?
                .unwrap_or(defaults.embed_batch_size),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse a numeric environment variable, rejecting garbage instead of ignoring it
    fn get_env_usize(key: &str) -> Result<Option<usize>, MatjipError> {
        match std::env::var(key) {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| MatjipError::config(format!("{} must be a number, got '{}'", key, raw))),
            Err(_) => Ok(None),
        }
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), MatjipError> {
        for dir in [&self.index_dir, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    MatjipError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), MatjipError> {
        if self.embedding_model.trim().is_empty() {
            return Err(MatjipError::config("Embedding model name cannot be empty"));
        }

        if self.llm_model.trim().is_empty() {
            return Err(MatjipError::config("LLM model name cannot be empty"));
        }

        if !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://")
        {
            return Err(MatjipError::config(
                "Ollama base URL must start with http:// or https://",
            ));
        }

        if self.default_top_k == 0 {
            return Err(MatjipError::config("DEFAULT_TOP_K must be at least 1"));
        }

        if self.embed_batch_size == 0 {
            return Err(MatjipError::config("EMBED_BATCH_SIZE must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.embedding_model, "bge-m3");
        assert_eq!(config.index_dir, PathBuf::from("./models/restaurant_index"));
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = AppConfig::default();
        invalid_config.embedding_model = String::new();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.ollama_base_url = "localhost:11434".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.default_top_k = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = AppConfig::default();
        invalid_config.embed_batch_size = 0;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_ensure_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig {
            index_dir: tmp.path().join("models/index"),
            log_dir: tmp.path().join("log"),
            ..AppConfig::default()
        };

        config.ensure_directories().unwrap();
        assert!(config.index_dir.is_dir());
        assert!(config.log_dir.is_dir());
    }
}
