use crate::error::RagError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Embedding backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face inference `feature-extraction` pipeline
    HuggingFace,
    /// Local Ollama `/api/embeddings`
    Ollama,
}

impl EmbeddingProvider {
    fn parse(value: &str) -> Result<Self, RagError> {
        match value.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            other => Err(RagError::configuration(format!(
                "Unknown embedding provider '{}' (expected huggingface or ollama)",
                other
            ))),
        }
    }
}

/// ProjectRAG application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// JSON export of the project table
    pub projects_path: PathBuf,

    /// Embedding backend
    pub embedding_provider: EmbeddingProvider,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding dimension, must match the vector index
    pub embedding_dimension: usize,

    /// Hugging Face inference base URL
    pub hf_api_base: String,

    /// Hugging Face access token
    pub hf_token: Option<String>,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Generation model name
    pub llm_model: String,

    /// Pinecone API key
    pub pinecone_api_key: Option<String>,

    /// Pinecone index name
    pub pinecone_index: Option<String>,

    /// Pinecone data-plane host, resolved from the index name when absent
    pub pinecone_index_host: Option<String>,

    /// Pinecone control-plane URL
    pub pinecone_control_url: String,

    /// Pinecone namespace (empty = default namespace)
    pub pinecone_namespace: String,

    /// Number of matches retrieved per question
    pub retrieval_top_k: usize,

    /// Timeout for embedding and index calls, in seconds
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
            projects_path: PathBuf::from("./data/projects.json"),
            embedding_provider: EmbeddingProvider::HuggingFace,
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            embedding_dimension: 384,
            hf_api_base: "https://router.huggingface.co/hf-inference".to_string(),
            hf_token: None,
            ollama_base_url: "http://localhost:11434".to_string(),
            llm_model: "llama3.2:latest".to_string(),
            pinecone_api_key: None,
            pinecone_index: None,
            pinecone_index_host: None,
            pinecone_control_url: "https://api.pinecone.io".to_string(),
            pinecone_namespace: String::new(),
            retrieval_top_k: 3,
            request_timeout_secs: 60,
        }
    }
}

/// Settings handed to the embedder at construction
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub api_base: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Settings handed to the vector index client at construction
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub api_key: String,
    pub index_name: Option<String>,
    pub host: Option<String>,
    pub control_url: String,
    pub namespace: String,
    pub dimension: usize,
    pub timeout: Duration,
}

/// Settings handed to the generation client at construction
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, RagError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let embedding_provider = match non_empty("EMBEDDING_PROVIDER") {
            Some(value) => EmbeddingProvider::parse(&value)?,
            None => defaults.embedding_provider,
        };

        Ok(Self {
            server_host: non_empty("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", non_empty("SERVER_PORT"), defaults.server_port)?,
            log_dir: non_empty("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            projects_path: non_empty("PROJECTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.projects_path),
            embedding_provider,
            embedding_model: non_empty("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dimension: parse_or(
                "EMBEDDING_DIMENSION",
                non_empty("EMBEDDING_DIMENSION"),
                defaults.embedding_dimension,
            )?,
            hf_api_base: non_empty("HF_API_BASE").unwrap_or(defaults.hf_api_base),
            hf_token: non_empty("HF_TOKEN"),
            ollama_base_url: non_empty("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            llm_model: non_empty("LLM_MODEL").unwrap_or(defaults.llm_model),
            pinecone_api_key: non_empty("PINECONE_API_KEY"),
            pinecone_index: non_empty("PINECONE_INDEX"),
            pinecone_index_host: non_empty("PINECONE_INDEX_HOST"),
            pinecone_control_url: non_empty("PINECONE_CONTROL_URL")
                .unwrap_or(defaults.pinecone_control_url),
            pinecone_namespace: non_empty("PINECONE_NAMESPACE").unwrap_or_default(),
            retrieval_top_k: parse_or(
                "RETRIEVAL_TOP_K",
                non_empty("RETRIEVAL_TOP_K"),
                defaults.retrieval_top_k,
            )?,
            request_timeout_secs: parse_or(
                "REQUEST_TIMEOUT_SECS",
                non_empty("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout_secs,
            )?,
        })
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RagError> {
        if self.server_port == 0 {
            return Err(RagError::configuration("Server port cannot be 0"));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(RagError::configuration("Embedding model name cannot be empty"));
        }

        if self.embedding_dimension == 0 {
            return Err(RagError::configuration("Embedding dimension cannot be 0"));
        }

        if self.retrieval_top_k == 0 {
            return Err(RagError::configuration("RETRIEVAL_TOP_K must be at least 1"));
        }

        if self.embedding_provider == EmbeddingProvider::HuggingFace {
            if self.hf_token.is_none() {
                return Err(RagError::configuration(
                    "HF_TOKEN is required for the huggingface embedding provider",
                ));
            }
            require_http("HF_API_BASE", &self.hf_api_base)?;
        }

        // Generation always goes through Ollama
        require_http("OLLAMA_BASE_URL", &self.ollama_base_url)?;

        if self.pinecone_api_key.is_none() {
            return Err(RagError::configuration("PINECONE_API_KEY is not set"));
        }

        match (&self.pinecone_index, &self.pinecone_index_host) {
            (None, None) => {
                return Err(RagError::configuration(
                    "Either PINECONE_INDEX or PINECONE_INDEX_HOST must be set",
                ))
            }
            // Console hosts have no scheme; the client adds https://
            (_, Some(_)) => {}
            (Some(_), None) => require_http("PINECONE_CONTROL_URL", &self.pinecone_control_url)?,
        }

        Ok(())
    }

    /// Embedder settings
    pub fn embedder(&self) -> EmbedderConfig {
        let api_base = match self.embedding_provider {
            EmbeddingProvider::HuggingFace => self.hf_api_base.clone(),
            EmbeddingProvider::Ollama => self.ollama_base_url.clone(),
        };

        EmbedderConfig {
            provider: self.embedding_provider,
            model: self.embedding_model.clone(),
            dimension: self.embedding_dimension,
            api_base,
            token: self.hf_token.clone(),
            timeout: self.request_timeout(),
        }
    }

    /// Vector index settings; fails when the API key is missing
    pub fn index(&self) -> Result<IndexConfig, RagError> {
        let api_key = self
            .pinecone_api_key
            .clone()
            .ok_or_else(|| RagError::configuration("PINECONE_API_KEY is not set"))?;

        Ok(IndexConfig {
            api_key,
            index_name: self.pinecone_index.clone(),
            host: self.pinecone_index_host.clone(),
            control_url: self.pinecone_control_url.clone(),
            namespace: self.pinecone_namespace.clone(),
            dimension: self.embedding_dimension,
            timeout: self.request_timeout(),
        })
    }

    /// Generation client settings
    pub fn chat(&self) -> ChatConfig {
        ChatConfig {
            base_url: self.ollama_base_url.clone(),
            model: self.llm_model.clone(),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, RagError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            RagError::configuration(format!("{} has an invalid value: {}", key, value))
        }),
        None => Ok(default),
    }
}

fn require_http(key: &str, url: &str) -> Result<(), RagError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(RagError::configuration(format!(
            "{} must start with http:// or https://",
            key
        )))
    }
}
