use async_trait::async_trait;
use projectrag_common::{IndexConfig, RagError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::index_trait::VectorIndex;
use crate::types::{
    DescribeStatsResponse, IndexDescription, IndexStats, QueryMatch, QueryRequest, QueryResponse,
    UpsertRequest, UpsertResponse, VectorRecord,
};

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2024-07";

/// Pinecone data-plane client
#[derive(Debug, Clone)]
pub struct PineconeClient {
    host: String,
    api_key: String,
    namespace: String,
    client: Client,
}

impl PineconeClient {
    /// Create a client for a known data-plane host
    pub fn new(
        host: impl Into<String>,
        api_key: impl Into<String>,
        namespace: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        let host = with_scheme(&host.into());
        info!("Pinecone client initialized: {}", host);

        Ok(Self {
            host,
            api_key: api_key.into(),
            namespace: namespace.into(),
            client,
        })
    }

    /// Create a client from configuration.
    ///
    /// Without an explicit host the index is looked up on the control plane,
    /// and its dimension must match the configured embedding dimension.
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        if let Some(host) = &config.host {
            return Self::new(host, &config.api_key, &config.namespace, config.timeout);
        }

        let index_name = config.index_name.as_deref().ok_or_else(|| {
            RagError::configuration("Either PINECONE_INDEX or PINECONE_INDEX_HOST must be set")
        })?;

        let description = describe_index(config, index_name).await?;
        if description.dimension != config.dimension {
            return Err(RagError::configuration(format!(
                "Index '{}' has dimension {}, but the embedder produces {}",
                index_name, description.dimension, config.dimension
            )));
        }

        Self::new(description.host, &config.api_key, &config.namespace, config.timeout)
    }

    fn post(&self, route: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.host, route))
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
    }

    async fn send<B, T>(&self, route: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .post(route)
            .json(body)
            .send()
            .await
            .map_err(|e| RagError::index(format!("Failed to reach index at {}: {}", route, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::index(format!(
                "Index rejected {} with {}: {}",
                route, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RagError::index(format!("Failed to parse {} response: {}", route, e)))
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.is_empty() {
            debug!("Skipping upsert of empty batch");
            return Ok(());
        }

        let request = UpsertRequest {
            vectors: &records,
            namespace: &self.namespace,
        };

        let response: UpsertResponse = self.send("/vectors/upsert", &request).await?;
        info!(
            "Upserted {} vectors (requested {})",
            response.upserted_count,
            records.len()
        );
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.namespace,
        };

        let response: QueryResponse = self.send("/query", &request).await?;
        let total = response.matches.len();

        let mut matches: Vec<QueryMatch> = response
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|metadata| QueryMatch {
                    id: m.id,
                    score: m.score,
                    metadata,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);

        debug!("Query returned {} matches ({} raw)", matches.len(), total);
        Ok(matches)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let filter = serde_json::json!({});
        let response: DescribeStatsResponse = self.send("/describe_index_stats", &filter).await?;

        Ok(IndexStats {
            total_vector_count: response.total_vector_count,
            dimension: response.dimension,
        })
    }
}

async fn describe_index(config: &IndexConfig, index_name: &str) -> Result<IndexDescription> {
    let url = format!(
        "{}/indexes/{}",
        config.control_url.trim_end_matches('/'),
        index_name
    );

    let client = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| RagError::configuration(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(&url)
        .header(API_KEY_HEADER, &config.api_key)
        .header(API_VERSION_HEADER, API_VERSION)
        .send()
        .await
        .map_err(|e| RagError::configuration(format!("Failed to reach Pinecone control plane: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RagError::configuration(format!(
            "Cannot describe index '{}' ({}): {}",
            index_name, status, body
        )));
    }

    let description: IndexDescription = response
        .json()
        .await
        .map_err(|e| RagError::configuration(format!("Invalid index description: {}", e)))?;

    info!(
        "Resolved index '{}' to host {} (dimension {})",
        index_name, description.host, description.dimension
    );
    Ok(description)
}

/// Control-plane hosts come back without a scheme
fn with_scheme(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordMetadata;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PineconeClient {
        PineconeClient::new(server.uri(), "pc_test", "", Duration::from_secs(5)).unwrap()
    }

    fn metadata(name: &str) -> RecordMetadata {
        RecordMetadata {
            project_name: name.to_string(),
            description: format!("{} description", name),
            languages: "{}".to_string(),
            owner: "bob".to_string(),
        }
    }

    fn index_config(control_url: &str, dimension: usize) -> IndexConfig {
        IndexConfig {
            api_key: "pc_test".to_string(),
            index_name: Some("projects".to_string()),
            host: None,
            control_url: control_url.to_string(),
            namespace: String::new(),
            dimension,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_upsert_sends_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(header("api-key", "pc_test"))
            .and(body_partial_json(json!({
                "vectors": [{"id": "0", "values": [0.5], "metadata": {"projectName": "A", "owner": "bob"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let record = VectorRecord {
            id: "0".to_string(),
            values: vec![0.5],
            metadata: metadata("A"),
        };
        client_for(&server).upsert(vec![record]).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_upsert_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        client_for(&server).upsert(Vec::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_rejection_is_index_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("Vector dimension 3 does not match 384"),
            )
            .mount(&server)
            .await;

        let record = VectorRecord {
            id: "0".to_string(),
            values: vec![0.1, 0.2, 0.3],
            metadata: metadata("A"),
        };
        match client_for(&server).upsert(vec![record]).await {
            Err(RagError::Index(message)) => assert!(message.contains("does not match")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_requests_metadata_and_drops_bare_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({"topK": 3, "includeMetadata": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "1", "score": 0.42, "metadata": {"projectName": "B", "description": "b", "languages": "{}", "owner": "x"}},
                    {"id": "2", "score": 0.99},
                    {"id": "0", "score": 0.87, "metadata": {"projectName": "A", "description": "a", "languages": "{}", "owner": "bob"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let matches = client_for(&server).query(&[0.5], 3).await.unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(matches[0].metadata.owner, "bob");
    }

    #[tokio::test]
    async fn test_query_truncates_to_top_k() {
        let server = MockServer::start().await;
        let matches: Vec<_> = (0..5)
            .map(|i| json!({"id": i.to_string(), "score": (i as f64) / 10.0, "metadata": {"projectName": "P"}}))
            .collect();
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "matches": matches })))
            .mount(&server)
            .await;

        let result = client_for(&server).query(&[0.5], 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "4");
    }

    #[tokio::test]
    async fn test_match_without_score_is_index_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    {"id": "0", "metadata": {"projectName": "A", "description": "a", "languages": "{}", "owner": "bob"}}
                ]
            })))
            .mount(&server)
            .await;

        match client_for(&server).query(&[0.5], 3).await {
            Err(RagError::Index(message)) => assert!(message.contains("/query")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stats() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/describe_index_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dimension": 384, "totalVectorCount": 12, "namespaces": {"": {"vectorCount": 12}}
            })))
            .mount(&server)
            .await;

        let stats = client_for(&server).stats().await.unwrap();
        assert_eq!(stats, IndexStats { total_vector_count: 12, dimension: 384 });
    }

    #[tokio::test]
    async fn test_connect_resolves_host_from_control_plane() {
        let control = MockServer::start().await;
        let data = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/projects"))
            .and(header("api-key", "pc_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects", "dimension": 384, "host": data.uri()
            })))
            .expect(1)
            .mount(&control)
            .await;

        let client = PineconeClient::connect(&index_config(&control.uri(), 384)).await.unwrap();
        assert_eq!(client.host, data.uri());
    }

    #[tokio::test]
    async fn test_connect_rejects_dimension_mismatch() {
        let control = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects", "dimension": 768, "host": "projects-abc.svc.pinecone.io"
            })))
            .mount(&control)
            .await;

        let result = PineconeClient::connect(&index_config(&control.uri(), 384)).await;
        assert!(matches!(result, Err(RagError::Configuration(_))));
    }

    #[test]
    fn test_with_scheme() {
        assert_eq!(with_scheme("idx.svc.pinecone.io"), "https://idx.svc.pinecone.io");
        assert_eq!(with_scheme("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }
}
