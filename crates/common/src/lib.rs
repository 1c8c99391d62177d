pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, ChatConfig, EmbedderConfig, EmbeddingProvider, IndexConfig};
pub use error::RagError;
pub type Result<T> = std::result::Result<T, RagError>;
