use async_trait::async_trait;
use futures::{Stream, StreamExt};
use projectrag_common::{RagError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::embedder::{normalize_embedding, Embedder};
use crate::llm_trait::{ChatModel, TextStream};
use crate::types::{ChatChunk, ChatMessage, ChatRequest, EmbedRequest, OllamaMessage, Role};

/// Chunks buffered between the HTTP reader and the consumer
const STREAM_BUFFER: usize = 32;

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client for long-lived streaming calls (connect timeout only)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let builder = Client::builder().connect_timeout(Duration::from_secs(10));
        Self::build(base_url.into(), builder)
    }

    /// Create new Ollama client whose requests fail after `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::build(base_url.into(), Client::builder().timeout(timeout))
    }

    fn build(base_url: String, builder: reqwest::ClientBuilder) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| RagError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Ollama client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Test connection to Ollama
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Ollama: {}", e))?;
        Ok(response.status().is_success())
    }

    /// Generate embedding for text (single attempt)
    pub async fn embed(&self, model: &str, text: &str, dimension: usize) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        debug!("Generating embedding - Model: {}, Text length: {}", model, text.len());

        let request = EmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::embedding(format!("Failed to send embedding request: {}", e)))?
            .error_for_status()
            .map_err(|e| RagError::embedding(format!("Ollama embedding API error: {}", e)))?;

        let result: Value = response
            .json()
            .await
            .map_err(|e| RagError::embedding(format!("Failed to parse embedding response: {}", e)))?;

        let raw = result
            .get("embedding")
            .ok_or_else(|| RagError::embedding("Ollama response has no embedding field"))?;

        let embedding = normalize_embedding(raw, dimension)?;
        debug!("Received embedding - Dimension: {}", embedding.len());
        Ok(embedding)
    }

    /// Start a streamed chat completion.
    ///
    /// The response body is read by a background task that forwards content
    /// chunks through a bounded channel. Dropping the returned stream stops the
    /// reader at its next send.
    pub async fn chat_stream(&self, request: ChatRequest) -> Result<TextStream> {
        let url = format!("{}/api/chat", self.base_url);

        debug!(
            "Sending chat request to Ollama - Model: {}, Messages: {}",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::generation(format!("Failed to send chat request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::generation(format!(
                "Ollama chat API error {}: {}",
                status, body
            )));
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let outcome = forward_chat_stream(response.bytes_stream(), tx).await;
            debug!("Chat stream reader finished: {:?}", outcome);
        });

        Ok(receiver_stream(rx))
    }
}

/// How the chat reader task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ForwardOutcome {
    /// Model reported `done`
    Completed,
    /// Consumer dropped the stream
    ConsumerGone,
    /// An error item was delivered to the consumer
    Failed,
}

/// Read NDJSON chat chunks from `body` and forward their content to `tx`
pub(crate) async fn forward_chat_stream<S, B, E>(
    body: S,
    tx: mpsc::Sender<Result<String>>,
) -> ForwardOutcome
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    futures::pin_mut!(body);
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx
                    .send(Err(RagError::generation(format!("Stream error: {}", e))))
                    .await;
                return ForwardOutcome::Failed;
            }
        };

        buffer.extend_from_slice(chunk.as_ref());

        while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            if let Some(outcome) = forward_line(&line, &tx).await {
                return outcome;
            }
        }
    }

    // Final line without trailing newline
    if let Some(outcome) = forward_line(&buffer, &tx).await {
        return outcome;
    }

    warn!("Chat stream ended before the model reported completion");
    let _ = tx
        .send(Err(RagError::generation("Stream ended before completion")))
        .await;
    ForwardOutcome::Failed
}

/// Forward one NDJSON line; `Some` ends the stream
async fn forward_line(line: &[u8], tx: &mpsc::Sender<Result<String>>) -> Option<ForwardOutcome> {
    let chunk = match parse_chat_line(line) {
        Ok(Some(chunk)) => chunk,
        Ok(None) => return None,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            return Some(ForwardOutcome::Failed);
        }
    };

    if let Some(error) = chunk.error {
        let _ = tx.send(Err(RagError::generation(error))).await;
        return Some(ForwardOutcome::Failed);
    }

    if let Some(content) = chunk.message.map(|m| m.content).filter(|c| !c.is_empty()) {
        if tx.send(Ok(content)).await.is_err() {
            return Some(ForwardOutcome::ConsumerGone);
        }
    }

    chunk.done.then_some(ForwardOutcome::Completed)
}

/// Parse one NDJSON line; blank lines yield `None`
pub(crate) fn parse_chat_line(line: &[u8]) -> Result<Option<ChatChunk>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| RagError::generation(format!("Malformed chat chunk: {}", e)))
}

fn receiver_stream(rx: mpsc::Receiver<Result<String>>) -> TextStream {
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}

/// Ollama `/api/embeddings` as an [`Embedder`]
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text, self.dimension).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Ollama `/api/chat` as a [`ChatModel`]
#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
}

impl OllamaChat {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Build the wire request: system instruction first, then the conversation unchanged
    pub fn build_request(&self, system: String, messages: &[ChatMessage]) -> ChatRequest {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(OllamaMessage {
            role: Role::System,
            content: system,
        });
        wire.extend(messages.iter().map(OllamaMessage::from));

        ChatRequest {
            model: self.model.clone(),
            messages: wire,
            stream: true,
        }
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn stream_chat(&self, system: String, messages: &[ChatMessage]) -> Result<TextStream> {
        let request = self.build_request(system, messages);
        self.client.chat_stream(request).await
    }
}
