//! Record metadata
//!
//! Vector stores only accept scalar metadata values. Structured values
//! (objects, arrays) are flattened to their JSON text before they reach a
//! store. Typed upload records convert into the scalar map through
//! [`to_metadata`].

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Scalar-only metadata as stored alongside a record
pub type Metadata = BTreeMap<String, MetadataValue>;

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

/// Flatten one JSON value into a scalar. Objects and arrays become their JSON text.
pub fn flatten_value(value: &Value) -> MetadataValue {
    match value {
        Value::Null => MetadataValue::Null,
        Value::Bool(b) => MetadataValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => MetadataValue::Int(i),
            None => n
                .as_f64()
                .map(MetadataValue::Float)
                .unwrap_or_else(|| MetadataValue::Str(n.to_string())),
        },
        Value::String(s) => MetadataValue::Str(s.clone()),
        Value::Array(_) | Value::Object(_) => MetadataValue::Str(value.to_string()),
    }
}

/// Flatten an arbitrary JSON object into scalar metadata. Never rejects a value.
pub fn flatten_metadata(map: &Map<String, Value>) -> Metadata {
    map.iter()
        .map(|(key, value)| (key.clone(), flatten_value(value)))
        .collect()
}

/// Serialize a typed record and flatten it into scalar metadata
pub fn to_metadata<T: Serialize>(record: &T) -> Result<Metadata> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(flatten_metadata(&map)),
        other => Err(Error::InvalidDocument(format!(
            "metadata must serialize to an object, got {}",
            other
        ))),
    }
}

/// Why a document was uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadContext {
    /// Standalone resume analysis
    Resume,
    /// Resume submitted together with a job description
    JdMatch,
}

impl UploadContext {
    /// Prefix namespacing record ids by usage context
    pub fn id_prefix(&self) -> &'static str {
        match self {
            UploadContext::Resume => "",
            UploadContext::JdMatch => "jd_match_",
        }
    }
}

impl fmt::Display for UploadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadContext::Resume => write!(f, "resume"),
            UploadContext::JdMatch => write!(f, "jd_match"),
        }
    }
}

/// Metadata recorded for an uploaded resume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeMetadata {
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub analysis_type: UploadContext,
    /// Extra parser output (skills, education, ...) flattened on conversion
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResumeMetadata {
    pub fn new(filename: impl Into<String>, analysis_type: UploadContext) -> Self {
        Self {
            filename: filename.into(),
            upload_date: Utc::now(),
            analysis_type,
            extra: Map::new(),
        }
    }

    pub fn to_metadata(&self) -> Result<Metadata> {
        to_metadata(self)
    }
}

/// Metadata recorded for an uploaded job description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub upload_date: DateTime<Utc>,
    pub analysis_type: UploadContext,
    /// Resume submitted alongside this job description, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_filename: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobMetadata {
    pub fn for_resume(resume_filename: impl Into<String>) -> Self {
        Self {
            upload_date: Utc::now(),
            analysis_type: UploadContext::JdMatch,
            resume_filename: Some(resume_filename.into()),
            extra: Map::new(),
        }
    }

    pub fn to_metadata(&self) -> Result<Metadata> {
        to_metadata(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_keeps_scalars() {
        let map = json!({
            "name": "Ada",
            "years": 7,
            "gpa": 3.9,
            "remote": true,
            "phone": null
        });
        let flat = flatten_metadata(map.as_object().unwrap());

        assert_eq!(flat["name"], MetadataValue::Str("Ada".to_string()));
        assert_eq!(flat["years"], MetadataValue::Int(7));
        assert_eq!(flat["gpa"], MetadataValue::Float(3.9));
        assert_eq!(flat["remote"], MetadataValue::Bool(true));
        assert_eq!(flat["phone"], MetadataValue::Null);
    }

    #[test]
    fn test_flatten_stringifies_structures() {
        let map = json!({
            "skills": ["rust", "sql"],
            "education": { "degree": "BSc" }
        });
        let flat = flatten_metadata(map.as_object().unwrap());

        assert_eq!(
            flat["skills"],
            MetadataValue::Str(r#"["rust","sql"]"#.to_string())
        );
        assert_eq!(
            flat["education"],
            MetadataValue::Str(r#"{"degree":"BSc"}"#.to_string())
        );
    }

    #[test]
    fn test_resume_metadata_conversion() {
        let mut record = ResumeMetadata::new("ada.txt", UploadContext::JdMatch);
        record.extra.insert("skills".to_string(), json!(["rust"]));

        let metadata = record.to_metadata().unwrap();
        assert_eq!(metadata["filename"].as_str(), Some("ada.txt"));
        assert_eq!(metadata["analysis_type"].as_str(), Some("jd_match"));
        assert_eq!(metadata["skills"].as_str(), Some(r#"["rust"]"#));
        assert!(metadata["upload_date"].as_str().is_some());
    }

    #[test]
    fn test_job_metadata_links_resume() {
        let metadata = JobMetadata::for_resume("ada.txt").to_metadata().unwrap();
        assert_eq!(metadata["resume_filename"].as_str(), Some("ada.txt"));
        assert_eq!(metadata["analysis_type"].as_str(), Some("jd_match"));
    }

    #[test]
    fn test_to_metadata_rejects_non_objects() {
        assert!(to_metadata(&vec![1, 2, 3]).is_err());
    }

    #[test]
    fn test_metadata_json_round_trip_shape() {
        let mut metadata = Metadata::new();
        metadata.insert("importance".to_string(), "high".into());
        metadata.insert("rank".to_string(), 2i64.into());

        let encoded = serde_json::to_string(&metadata).unwrap();
        assert_eq!(encoded, r#"{"importance":"high","rank":2}"#);

        let decoded: Metadata = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, metadata);
    }
}
