use projectrag_common::{AppConfig, Result};
use projectrag_llm::{build_embedder, ChatModel, Embedder, OllamaChat, OllamaClient};
use projectrag_rag::{Indexer, JsonFileSource, ProjectSource, Retriever};
use projectrag_vector::{PineconeClient, VectorIndex};
use std::sync::Arc;
use tracing::info;

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Index build pipeline
    pub indexer: Indexer,

    /// Question answering pipeline
    pub retriever: Retriever,

    /// Vector index, for statistics
    pub index: Arc<dyn VectorIndex>,

    /// Generation backend, for health checks
    pub ollama: Option<OllamaClient>,
}

impl AppState {
    /// Validate configuration and connect every collaborator
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let embedder = build_embedder(&config.embedder())?;
        let index: Arc<dyn VectorIndex> = Arc::new(PineconeClient::connect(&config.index()?).await?);

        let chat_config = config.chat();
        let ollama = OllamaClient::new(&chat_config.base_url)?;
        let chat: Arc<dyn ChatModel> = Arc::new(OllamaChat::new(ollama.clone(), &chat_config.model));

        let source: Arc<dyn ProjectSource> = Arc::new(JsonFileSource::new(&config.projects_path));

        info!(
            "Pipelines ready - embedding: {}, generation: {}, top_k: {}",
            config.embedding_model, config.llm_model, config.retrieval_top_k
        );

        Ok(Self::from_parts(config, source, embedder, index, chat, Some(ollama)))
    }

    /// Assemble state from already-built collaborators
    pub fn from_parts(
        config: AppConfig,
        source: Arc<dyn ProjectSource>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        ollama: Option<OllamaClient>,
    ) -> Self {
        let indexer = Indexer::new(source, embedder.clone(), index.clone());
        let retriever = Retriever::new(embedder, index.clone(), chat, config.retrieval_top_k);

        Self {
            config,
            indexer,
            retriever,
            index,
            ollama,
        }
    }
}
