use async_trait::async_trait;
use futures::stream::BoxStream;
use projectrag_common::Result;

use crate::types::ChatMessage;

/// Incrementally delivered model output; an `Err` item is terminal
pub type TextStream = BoxStream<'static, Result<String>>;

/// Common trait for streaming chat models
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Start generation with a system instruction followed by the conversation.
    ///
    /// Errors returned here happen before any chunk is produced.
    async fn stream_chat(&self, system: String, messages: &[ChatMessage]) -> Result<TextStream>;
}
