use serde::{Deserialize, Serialize};

/// Metadata stored alongside every project vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Project display name
    #[serde(rename = "projectName", default)]
    pub project_name: String,

    /// Description text that was embedded
    #[serde(default)]
    pub description: String,

    /// JSON-serialized language mapping
    #[serde(default)]
    pub languages: String,

    /// Project owner
    #[serde(default)]
    pub owner: String,
}

/// Vector index entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Record ID
    pub id: String,

    /// Embedding values
    pub values: Vec<f32>,

    /// Project metadata
    pub metadata: RecordMetadata,
}

/// Similarity search result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    /// Record ID
    pub id: String,

    /// Similarity score (higher is closer)
    pub score: f32,

    /// Metadata
    pub metadata: RecordMetadata,
}

/// Index statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_vector_count: u64,
    pub dimension: usize,
}

// Pinecone wire types

#[derive(Debug, Serialize)]
pub(crate) struct UpsertRequest<'a> {
    pub vectors: &'a [VectorRecord],

    #[serde(skip_serializing_if = "str::is_empty")]
    pub namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpsertResponse {
    #[serde(default)]
    pub upserted_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryRequest<'a> {
    pub vector: &'a [f32],
    pub top_k: usize,
    pub include_metadata: bool,
    pub include_values: bool,

    #[serde(skip_serializing_if = "str::is_empty")]
    pub namespace: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMatch {
    pub id: String,

    pub score: f32,

    #[serde(default)]
    pub metadata: Option<RecordMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescribeStatsResponse {
    #[serde(default)]
    pub dimension: usize,

    #[serde(default)]
    pub total_vector_count: u64,
}

/// Control-plane index description
#[derive(Debug, Deserialize)]
pub(crate) struct IndexDescription {
    pub host: String,
    pub dimension: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_with_wire_names() {
        let record = VectorRecord {
            id: "0".to_string(),
            values: vec![0.5],
            metadata: RecordMetadata {
                project_name: "A".to_string(),
                description: "desc".to_string(),
                languages: r#"{"js":10}"#.to_string(),
                owner: "bob".to_string(),
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["metadata"]["projectName"], "A");
        assert_eq!(value["metadata"]["languages"], r#"{"js":10}"#);
    }

    #[test]
    fn test_query_request_omits_default_namespace() {
        let request = QueryRequest {
            vector: &[0.5],
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: "",
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"vector": [0.5], "topK": 3, "includeMetadata": true, "includeValues": false})
        );
    }
}
