/// ProjectRAG error types
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    /// Missing or invalid configuration (credentials, index, URLs, dimensions)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Embedding model call failed or returned malformed output
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index rejected an upsert or query
    #[error("Index error: {0}")]
    Index(String),

    /// Request carries no usable user message
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Generation model failed to start or broke mid-stream
    #[error("Generation error: {0}")]
    Generation(String),

    /// Project source store could not be read
    #[error("Source error: {0}")]
    Source(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Create configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create embedding error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create index error
    pub fn index<S: Into<String>>(msg: S) -> Self {
        Self::Index(msg.into())
    }

    /// Create invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create generation error
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        Self::Generation(msg.into())
    }

    /// Create source error
    pub fn source<S: Into<String>>(msg: S) -> Self {
        Self::Source(msg.into())
    }

    /// Short machine-readable kind, used in JSON error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Embedding(_) => "embedding",
            Self::Index(_) => "index",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Generation(_) => "generation",
            Self::Source(_) => "source",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "internal",
        }
    }
}

// HTTP response conversion
impl RagError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Json(_) => 400,
            Self::Configuration(_) => 500,
            Self::Embedding(_) => 502,
            Self::Index(_) => 502,
            Self::Generation(_) => 502,
            Self::Source(_) => 500,
            Self::Io(_) => 500,
            Self::Other(_) => 500,
        }
    }
}
