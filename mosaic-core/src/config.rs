use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MosaicConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub completion: CompletionSettings,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Model name; resolves to `<model_dir>/<name>.onnx` and `<name>-tokenizer.json`.
    pub name: String,
    /// Empty means the default data directory.
    #[serde(default)]
    pub model_dir: String,
    pub max_length: usize,
    /// BERT-style exports take `token_type_ids`; RoBERTa exports do not.
    #[serde(default)]
    pub token_type_ids: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "Personality_LM".to_string(),
            model_dir: String::new(),
            max_length: 64,
            token_type_ids: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionSettings {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "mixtral-8x7b-32768".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_seconds: 60,
            max_retries: 0,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Sessions untouched for this long are dropped.
    pub idle_timeout_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: 3600,
            sweep_interval_seconds: 60,
        }
    }
}

impl MosaicConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
