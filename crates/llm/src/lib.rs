//! ProjectRAG model integration
//!
//! Sentence embedders (Hugging Face, Ollama) and the Ollama streaming chat client

mod client;
mod embedder;
mod huggingface;
mod llm_trait;
mod types;

pub use client::{OllamaChat, OllamaClient, OllamaEmbedder};
pub use embedder::{build_embedder, ensure_finite, normalize_embedding, Embedder};
pub use huggingface::HuggingFaceEmbedder;
pub use llm_trait::{ChatModel, TextStream};
pub use types::{
    ChatChunk, ChatMessage, ChatRequest, ContentPart, MessageContent, OllamaMessage, Role,
};
