use projectrag_llm::ChatMessage;
use projectrag_vector::QueryMatch;
use serde::{Deserialize, Serialize};

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
}

/// Indexing trigger response
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub success: bool,
    pub message: String,

    /// Projects embedded and upserted
    pub count: usize,

    /// Projects excluded for a blank description
    pub skipped: usize,
}

/// Error payload shared by every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,

    /// What the route was trying to do
    pub error: String,

    /// Underlying failure
    pub details: String,

    /// Error category (configuration, embedding, index, ...)
    pub kind: String,
}

/// Search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query text
    pub q: String,

    /// Top K results, defaults to the configured retrieval size
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub query: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    pub score: f32,
    pub project_name: String,
    pub owner: String,
    pub description: String,
    pub languages: String,
}

impl From<QueryMatch> for SearchResultItem {
    fn from(found: QueryMatch) -> Self {
        Self {
            id: found.id,
            score: found.score,
            project_name: found.metadata.project_name,
            owner: found.metadata.owner,
            description: found.metadata.description,
            languages: found.metadata.languages,
        }
    }
}

/// Index statistics response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_vectors: u64,
    pub dimension: usize,
    pub embedding_model: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub llm_reachable: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
