//! ProjectRAG pipelines
//!
//! Index build (project store → embeddings → vector index) and
//! query-time retrieval with a grounded, streamed answer

mod indexing;
mod prompts;
mod retrieval;
mod source;

pub use indexing::{record_id, IndexReport, Indexer};
pub use prompts::{render_context, render_match, system_prompt, CONTEXT_SEPARATOR, REFUSAL};
pub use retrieval::{last_user_question, GroundedPrompt, Retriever};
pub use source::{JsonFileSource, ProjectSource, SourceRecord, UNKNOWN_OWNER, UNNAMED_PROJECT};
