use thiserror::Error;

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Gemini API key cannot be empty")]
    EmptyGeminiKey,

    #[error("Tavily API key cannot be empty")]
    EmptyTavilyKey,

    #[error("Max sources must be at least 1")]
    InvalidMaxSources,
}

/// Configuration for the research server
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub tavily_api_key: String,
    pub gemini_model: String,
    pub max_sources: usize,
}

impl Config {
    /// Create a new config with validation
    pub fn try_new(
        gemini_api_key: String,
        tavily_api_key: String,
        gemini_model: String,
        max_sources: usize,
    ) -> Result<Self, ConfigError> {
        if gemini_api_key.trim().is_empty() {
            return Err(ConfigError::EmptyGeminiKey);
        }
        if tavily_api_key.trim().is_empty() {
            return Err(ConfigError::EmptyTavilyKey);
        }
        if max_sources == 0 {
            return Err(ConfigError::InvalidMaxSources);
        }

        Ok(Self {
            gemini_api_key,
            tavily_api_key,
            gemini_model,
            max_sources,
        })
    }
}
