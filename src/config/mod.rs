//! Environment-sourced, validated configuration surface.

pub mod error;
pub mod prompts;


pub use error::ConfigError;
pub use prompts::PromptTemplates;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Process-wide configuration, loaded once at startup via [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,

    pub embedding_model_name: String,
    pub embedding_model_path: Option<PathBuf>,
    pub embedding_tokenizer_path: Option<PathBuf>,

    pub vector_index_name: String,
    pub qdrant_url: String,

    pub candidates_to_retrieve: usize,
    pub final_results: usize,
    pub top_k: usize,

    pub llm_key: Option<String>,
    pub llm_rerank_enabled: bool,
    pub query_expansion_enabled: bool,
    pub query_expansions: usize,

    pub llm_rate_limit_sleep: Duration,
    pub llm_retries: usize,
    pub llm_max_concurrency: usize,

    pub cache_ttl_seconds: u64,

    pub prompts: PromptTemplates,
}

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_VECTOR_INDEX_NAME: &str = "codesearch_records";
pub const DEFAULT_EMBEDDING_MODEL_NAME: &str = "sinter-embed";
pub const DEFAULT_CANDIDATES_TO_RETRIEVE: usize = 15;
pub const DEFAULT_FINAL_RESULTS: usize = 5;
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_QUERY_EXPANSIONS: usize = 6;
pub const DEFAULT_LLM_RATE_LIMIT_SLEEP: Duration = Duration::from_millis(500);
pub const DEFAULT_LLM_RETRIES: usize = 2;
pub const DEFAULT_LLM_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            port: 8080,
            embedding_model_name: DEFAULT_EMBEDDING_MODEL_NAME.to_string(),
            embedding_model_path: None,
            embedding_tokenizer_path: None,
            vector_index_name: DEFAULT_VECTOR_INDEX_NAME.to_string(),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            candidates_to_retrieve: DEFAULT_CANDIDATES_TO_RETRIEVE,
            final_results: DEFAULT_FINAL_RESULTS,
            top_k: DEFAULT_TOP_K,
            llm_key: None,
            llm_rerank_enabled: true,
            query_expansion_enabled: true,
            query_expansions: DEFAULT_QUERY_EXPANSIONS,
            llm_rate_limit_sleep: DEFAULT_LLM_RATE_LIMIT_SLEEP,
            llm_retries: DEFAULT_LLM_RETRIES,
            llm_max_concurrency: DEFAULT_LLM_MAX_CONCURRENCY,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            prompts: PromptTemplates::default(),
        }
    }
}

impl Config {
    const ENV_HOST: &'static str = "HOST";
    const ENV_PORT: &'static str = "PORT";
    const ENV_EMBEDDING_MODEL_NAME: &'static str = "EMBEDDING_MODEL_NAME";
    const ENV_EMBEDDING_MODEL_PATH: &'static str = "EMBEDDING_MODEL_PATH";
    const ENV_EMBEDDING_TOKENIZER_PATH: &'static str = "EMBEDDING_TOKENIZER_PATH";
    const ENV_VECTOR_INDEX_NAME: &'static str = "VECTOR_INDEX_NAME";
    const ENV_QDRANT_URL: &'static str = "QDRANT_URL";
    const ENV_CANDIDATES_TO_RETRIEVE: &'static str = "CANDIDATES_TO_RETRIEVE";
    const ENV_FINAL_RESULTS: &'static str = "FINAL_RESULTS";
    const ENV_TOP_K: &'static str = "TOP_K";
    const ENV_LLM_KEY: &'static str = "LLM_KEY";
    const ENV_LLM_RERANK_ENABLED: &'static str = "LLM_RERANK_ENABLED";
    const ENV_QUERY_EXPANSION_ENABLED: &'static str = "QUERY_EXPANSION_ENABLED";
    const ENV_QUERY_EXPANSIONS: &'static str = "QUERY_EXPANSIONS";
    const ENV_LLM_RATE_LIMIT_SLEEP: &'static str = "LLM_RATE_LIMIT_SLEEP";
    const ENV_LLM_RETRIES: &'static str = "LLM_RETRIES";
    const ENV_LLM_MAX_CONCURRENCY: &'static str = "LLM_MAX_CONCURRENCY";
    const ENV_CACHE_TTL_SECONDS: &'static str = "CACHE_TTL_SECONDS";

    /// Loads configuration from environment variables, falling back to documented defaults.
    ///
    /// Prompt templates are not currently environment-sourced (see [`PromptTemplates::default`]);
    /// a host embedding this crate that wants custom prompts constructs `Config` directly.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = Self::parse_ip_from_env(Self::ENV_HOST, defaults.host)?;
        let port = Self::parse_port_from_env(defaults.port)?;
        let embedding_model_name = Self::parse_string_from_env(
            Self::ENV_EMBEDDING_MODEL_NAME,
            defaults.embedding_model_name,
        );
        let embedding_model_path = Self::parse_optional_path_from_env(Self::ENV_EMBEDDING_MODEL_PATH);
        let embedding_tokenizer_path =
            Self::parse_optional_path_from_env(Self::ENV_EMBEDDING_TOKENIZER_PATH);
        let vector_index_name =
            Self::parse_string_from_env(Self::ENV_VECTOR_INDEX_NAME, defaults.vector_index_name);
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let candidates_to_retrieve = Self::parse_usize_from_env(
            Self::ENV_CANDIDATES_TO_RETRIEVE,
            defaults.candidates_to_retrieve,
        );
        let final_results =
            Self::parse_usize_from_env(Self::ENV_FINAL_RESULTS, defaults.final_results);
        let top_k = Self::parse_usize_from_env(Self::ENV_TOP_K, defaults.top_k);
        let llm_key = Self::parse_optional_string_from_env(Self::ENV_LLM_KEY);
        let llm_rerank_enabled =
            Self::parse_bool_from_env(Self::ENV_LLM_RERANK_ENABLED, defaults.llm_rerank_enabled);
        let query_expansion_enabled = Self::parse_bool_from_env(
            Self::ENV_QUERY_EXPANSION_ENABLED,
            defaults.query_expansion_enabled,
        );
        let query_expansions =
            Self::parse_usize_from_env(Self::ENV_QUERY_EXPANSIONS, defaults.query_expansions);
        let llm_rate_limit_sleep = Self::parse_duration_secs_from_env(
            Self::ENV_LLM_RATE_LIMIT_SLEEP,
            defaults.llm_rate_limit_sleep,
        );
        let llm_retries = Self::parse_usize_from_env(Self::ENV_LLM_RETRIES, defaults.llm_retries);
        let llm_max_concurrency = Self::parse_usize_from_env(
            Self::ENV_LLM_MAX_CONCURRENCY,
            defaults.llm_max_concurrency,
        );
        let cache_ttl_seconds =
            Self::parse_u64_from_env(Self::ENV_CACHE_TTL_SECONDS, defaults.cache_ttl_seconds);

        Ok(Self {
            host,
            port,
            embedding_model_name,
            embedding_model_path,
            embedding_tokenizer_path,
            vector_index_name,
            qdrant_url,
            candidates_to_retrieve,
            final_results,
            top_k,
            llm_key,
            llm_rerank_enabled,
            query_expansion_enabled,
            query_expansions,
            llm_rate_limit_sleep,
            llm_retries,
            llm_max_concurrency,
            cache_ttl_seconds,
            prompts: PromptTemplates::default(),
        })
    }

    /// Validates path existence, positivity of numeric settings, and prompt templates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.embedding_model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(ref path) = self.embedding_tokenizer_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if self.candidates_to_retrieve == 0 {
            return Err(ConfigError::MustBePositive {
                name: "CANDIDATES_TO_RETRIEVE",
                value: 0,
            });
        }
        if self.final_results == 0 {
            return Err(ConfigError::MustBePositive {
                name: "FINAL_RESULTS",
                value: 0,
            });
        }
        if self.top_k == 0 {
            return Err(ConfigError::MustBePositive {
                name: "TOP_K",
                value: 0,
            });
        }
        if self.llm_max_concurrency == 0 {
            return Err(ConfigError::MustBePositive {
                name: "LLM_MAX_CONCURRENCY",
                value: 0,
            });
        }

        self.prompts.validate()?;

        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `true` if the LLM gateway is usable (an API key is configured).
    pub fn llm_configured(&self) -> bool {
        self.llm_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_ip_from_env(var_name: &str, default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_bool_from_env(var_name: &str, default: bool) -> bool {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn parse_usize_from_env(var_name: &str, default: usize) -> usize {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_duration_secs_from_env(var_name: &str, default: Duration) -> Duration {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(Duration::from_secs_f64)
            .unwrap_or(default)
    }
}
