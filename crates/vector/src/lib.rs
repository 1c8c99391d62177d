//! ProjectRAG vector index client
//!
//! Upsert and top-K similarity query against a managed Pinecone index

mod client;
mod index_trait;
mod types;

pub use client::PineconeClient;
pub use index_trait::VectorIndex;
pub use types::{IndexStats, QueryMatch, RecordMetadata, VectorRecord};
