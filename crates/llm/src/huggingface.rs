use async_trait::async_trait;
use projectrag_common::{EmbedderConfig, RagError, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::embedder::{normalize_embedding, Embedder};
use crate::types::FeatureExtractionRequest;

/// Hugging Face inference client for sentence-transformer models
#[derive(Debug, Clone)]
pub struct HuggingFaceEmbedder {
    endpoint: String,
    token: String,
    model: String,
    dimension: usize,
    client: Client,
}

impl HuggingFaceEmbedder {
    /// Create new embedder; the token is required
    pub fn new(config: &EmbedderConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| RagError::configuration("HF_TOKEN is not set"))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RagError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/models/{}/pipeline/feature-extraction",
            config.api_base.trim_end_matches('/'),
            config.model
        );

        info!("Hugging Face embedder initialized: {}", config.model);
        Ok(Self {
            endpoint,
            token,
            model: config.model.clone(),
            dimension: config.dimension,
            client,
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding - Model: {}, Text length: {}", self.model, text.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&FeatureExtractionRequest { inputs: text })
            .send()
            .await
            .map_err(|e| RagError::embedding(format!("Failed to send embedding request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::embedding(format!(
                "Hugging Face API error {}: {}",
                status, body
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| RagError::embedding(format!("Failed to parse embedding response: {}", e)))?;

        let embedding = normalize_embedding(&raw, self.dimension)?;
        debug!("Received embedding - Dimension: {}", embedding.len());
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
