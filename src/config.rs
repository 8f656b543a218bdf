use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A model to generate responses with
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelSpec {
    /// Display name used in output columns and evaluation records
    pub name: String,
    /// Model identifier passed to the inference runtime
    pub id: String,
}

/// Configuration for the generation pipeline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// OpenAI-compatible API endpoint of the local inference runtime
    pub api_endpoint: String,
    /// Environment variable name containing the API key;
    /// local runtimes usually ignore the key, so this is optional
    #[serde(default)]
    pub env_var_api_key: Option<String>,
    /// Models to generate responses with
    pub models: Vec<ModelSpec>,
    /// Number of independent requests per prompt per model
    #[serde(default = "default_repeat_count")]
    pub repeat_count: usize,
    /// Fixed delay after each request, in seconds
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
    /// Temperature for response generation
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens for response generation
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationConfig {
    /// Chat completion API endpoint of the judge
    pub api_endpoint: String,
    /// Environment variable name containing the judge API key
    pub env_var_api_key: String,
    /// Judge model identifier
    pub model: String,
    /// Temperature for scoring calls; kept low for reproducibility
    #[serde(default = "default_judge_temperature")]
    pub temperature: f64,
    /// Fixed delay after each scoring call, in seconds
    #[serde(default = "default_judge_delay_secs")]
    pub request_delay_secs: u64,
    /// Maximum tokens for scoring replies
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_repeat_count() -> usize {
    5
}

fn default_request_delay_secs() -> u64 {
    2
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_judge_temperature() -> f64 {
    0.1
}

fn default_judge_delay_secs() -> u64 {
    1
}

/// Root configuration for both pipelines
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Generation pipeline settings
    pub generation: GenerationConfig,
    /// Evaluation pipeline settings
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }
}
