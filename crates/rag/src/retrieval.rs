use projectrag_common::{RagError, Result};
use projectrag_llm::{ChatMessage, ChatModel, Embedder, Role, TextStream};
use projectrag_vector::{QueryMatch, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info};

use crate::prompts::{render_context, system_prompt};

/// Everything needed to ground one answer
#[derive(Debug, Clone)]
pub struct GroundedPrompt {
    /// Last user question
    pub question: String,

    /// Retrieved matches, best first
    pub matches: Vec<QueryMatch>,

    /// Rendered context block
    pub context: String,

    /// System instruction sent to the model
    pub system: String,
}

/// Answers questions from the vector index through a grounded chat model
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed `query` and return the `top_k` closest projects
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<QueryMatch>> {
        let vector = self.embedder.embed(query).await?;
        debug!("Query embedded ({} dims)", vector.len());

        let matches = self.index.query(&vector, top_k).await?;
        debug!("Retrieved {} matches", matches.len());
        Ok(matches)
    }

    /// Validate, embed, retrieve and build the grounding instruction
    pub async fn prepare(&self, messages: &[ChatMessage]) -> Result<GroundedPrompt> {
        let question = last_user_question(messages)?.to_string();
        debug!("Request validated - {} messages", messages.len());

        let matches = self.search(&question, self.top_k).await?;
        let context = render_context(&matches);
        let system = system_prompt(&context);

        Ok(GroundedPrompt {
            question,
            matches,
            context,
            system,
        })
    }

    /// Ground the conversation and start streaming the answer.
    ///
    /// Errors before the first chunk are returned directly; later failures
    /// arrive as the final stream item.
    pub async fn answer(&self, messages: &[ChatMessage]) -> Result<TextStream> {
        let grounded = self.prepare(messages).await?;

        info!(
            "Answering with {} retrieved projects (context {} chars)",
            grounded.matches.len(),
            grounded.context.len()
        );

        self.chat.stream_chat(grounded.system, messages).await
    }
}

/// Content of the last user message, which must be plain text
pub fn last_user_question(messages: &[ChatMessage]) -> Result<&str> {
    let last_user = messages
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .ok_or_else(|| RagError::invalid_request("No user message found"))?;

    last_user
        .content
        .as_text()
        .ok_or_else(|| RagError::invalid_request("The last user message must be plain text"))
}
