use async_trait::async_trait;
use projectrag_common::Result;

use crate::types::{IndexStats, QueryMatch, VectorRecord};

/// Managed external vector index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or overwrite records by id; an empty batch is a no-op
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()>;

    /// Top-`top_k` matches by descending score, metadata always included
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;

    /// Vector count and dimension reported by the service
    async fn stats(&self) -> Result<IndexStats>;
}
