use async_trait::async_trait;
use projectrag_common::{EmbedderConfig, EmbeddingProvider, RagError, Result};
use serde_json::Value;
use std::sync::Arc;

use crate::client::{OllamaClient, OllamaEmbedder};
use crate::huggingface::HuggingFaceEmbedder;

/// Sentence embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `text` into a vector of exactly [`Embedder::dimension`] finite floats
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Configured output dimension
    fn dimension(&self) -> usize;
}

/// Build the embedder selected by configuration
pub fn build_embedder(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::HuggingFace => Arc::new(HuggingFaceEmbedder::new(config)?),
        EmbeddingProvider::Ollama => {
            let client = OllamaClient::with_timeout(&config.api_base, config.timeout)?;
            Arc::new(OllamaEmbedder::new(client, &config.model, config.dimension))
        }
    };

    Ok(embedder)
}

/// Normalize a raw model response into a flat vector of `dimension` floats.
///
/// Nested (token-level) output is flattened in order, never pooled, so a model
/// that does not pool will fail the dimension check.
pub fn normalize_embedding(raw: &Value, dimension: usize) -> Result<Vec<f32>> {
    let mut values = Vec::with_capacity(dimension);
    flatten_into(raw, &mut values)?;

    if values.is_empty() {
        return Err(RagError::embedding("Model returned an empty embedding"));
    }

    if values.len() != dimension {
        return Err(RagError::embedding(format!(
            "Embedding has dimension {}, expected {}",
            values.len(),
            dimension
        )));
    }

    Ok(values)
}

fn flatten_into(value: &Value, out: &mut Vec<f32>) -> Result<()> {
    match value {
        Value::Array(items) => items.iter().try_for_each(|item| flatten_into(item, out)),
        Value::Number(number) => {
            let component = number
                .as_f64()
                .map(|n| n as f32)
                .filter(|n| n.is_finite())
                .ok_or_else(|| {
                    RagError::embedding(format!("Non-finite embedding component: {}", number))
                })?;
            out.push(component);
            Ok(())
        }
        other => Err(RagError::embedding(format!(
            "Non-numeric embedding component: {}",
            other
        ))),
    }
}

/// Check that every component of an already-typed vector is finite
pub fn ensure_finite(vector: &[f32]) -> Result<()> {
    match vector.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(RagError::embedding(format!(
            "Embedding component {} is not a finite number",
            position
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_vector_passes_through() {
        let vector = normalize_embedding(&json!([0.1, -0.2, 0.3]), 3).unwrap();
        assert_eq!(vector, vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_nested_vector_is_flattened_not_averaged() {
        let vector = normalize_embedding(&json!([[1.0, 2.0], [3.0, 4.0]]), 4).unwrap();
        assert_eq!(vector, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_wrong_dimension_fails() {
        let err = normalize_embedding(&json!([[1.0, 2.0], [3.0, 4.0]]), 2).unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[test]
    fn test_non_numeric_component_fails() {
        assert!(normalize_embedding(&json!([0.1, "x", 0.3]), 3).is_err());
        assert!(normalize_embedding(&json!([0.1, null, 0.3]), 3).is_err());
        assert!(normalize_embedding(&json!({"error": "loading"}), 3).is_err());
    }

    #[test]
    fn test_overflowing_component_fails() {
        assert!(normalize_embedding(&json!([1e300, 0.0]), 2).is_err());
    }

    #[test]
    fn test_empty_fails() {
        assert!(normalize_embedding(&json!([]), 0).is_err());
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(&[0.0, 1.5]).is_ok());
        assert!(ensure_finite(&[0.0, f32::NAN]).is_err());
        assert!(ensure_finite(&[f32::INFINITY]).is_err());
    }
}
