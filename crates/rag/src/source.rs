use async_trait::async_trait;
use projectrag_common::{RagError, Result};
use projectrag_vector::RecordMetadata;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Fallback name for records without one
pub const UNNAMED_PROJECT: &str = "Unnamed Project";

/// Fallback owner for records without one
pub const UNKNOWN_OWNER: &str = "Unknown Owner";

/// Project row as exported from the backing store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Primary key, used as the stable vector id when present
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,

    #[serde(rename = "projectName", default)]
    pub name: Option<String>,

    #[serde(rename = "aiDescription", default)]
    pub description: Option<String>,

    #[serde(rename = "projectOwner", default)]
    pub owner: Option<String>,

    /// Language usage, usually a mapping but stored however the export gives it
    #[serde(default)]
    pub languages: Option<Value>,
}

impl SourceRecord {
    /// Only records with a non-blank description are indexed
    pub fn is_eligible(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }

    /// Primary key, if the store supplied a non-blank one
    pub fn stable_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Metadata stored next to the vector
    pub fn to_metadata(&self) -> Result<RecordMetadata> {
        let languages = match &self.languages {
            None | Some(Value::Null) => "{}".to_string(),
            Some(languages) => serde_json::to_string(languages)?,
        };

        Ok(RecordMetadata {
            project_name: non_blank(self.name.as_deref()).unwrap_or(UNNAMED_PROJECT).to_string(),
            description: self.description.clone().unwrap_or_default(),
            languages,
            owner: non_blank(self.owner.as_deref()).unwrap_or(UNKNOWN_OWNER).to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "project id must be a string or number, got {}",
            other
        ))),
    }
}

/// Read-only bulk access to the project store
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// All project records, in store order
    async fn fetch_all(&self) -> Result<Vec<SourceRecord>>;
}

/// Project store exported as a JSON array
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProjectSource for JsonFileSource {
    async fn fetch_all(&self) -> Result<Vec<SourceRecord>> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RagError::source(format!(
                "Failed to read projects from {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let records: Vec<SourceRecord> = serde_json::from_str(&data).map_err(|e| {
            RagError::source(format!(
                "Invalid project export {}: {}",
                self.path.display(),
                e
            ))
        })?;

        info!("Loaded {} project records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
