use qdrant_client::qdrant::ScoredPoint;
use qdrant_client::qdrant::point_id::PointIdOptions;
use serde_json::Value;

/// A record about to be written to the vector store: a stable id, the ANN-indexed
/// `main_vec`, and the full JSON document stored as payload (retrieved verbatim on search).
#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: String,
    pub main_vec: Vec<f32>,
    pub document: Value,
}

impl VectorPoint {
    pub fn new(id: impl Into<String>, main_vec: Vec<f32>, document: Value) -> Self {
        Self {
            id: id.into(),
            main_vec,
            document,
        }
    }
}

/// A single ANN hit: the store's raw similarity score plus the full stored document.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub document: Value,
}

impl SearchHit {
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Uuid(s)) => s,
            Some(PointIdOptions::Num(n)) => n.to_string(),
            None => return None,
        };

        let document = payload_to_json(point.payload);

        Some(SearchHit {
            id,
            score: point.score,
            document,
        })
    }
}

/// Converts a Qdrant payload map back into a `serde_json::Value` object.
///
/// The crate stores the entire document as a single `"document"` payload field
/// (itself a JSON-encoded string) so arbitrary record shapes round-trip without needing
/// a Qdrant `Value` ↔ `serde_json::Value` field-by-field conversion.
pub fn payload_to_json(
    payload: std::collections::HashMap<String, qdrant_client::qdrant::Value>,
) -> Value {
    payload
        .get("document")
        .and_then(|v| v.as_str())
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or(Value::Null)
}

/// Encodes a document as the single `"document"` Qdrant payload field.
pub fn json_to_payload(
    document: &Value,
) -> std::collections::HashMap<String, qdrant_client::qdrant::Value> {
    let mut payload = std::collections::HashMap::new();
    payload.insert(
        "document".to_string(),
        serde_json::to_string(document).unwrap_or_default().into(),
    );
    if let Some(value) = indexed_filter_value(document) {
        payload.insert("feature".to_string(), value.into());
    }
    payload
}

/// Extracts the value of the single indexed metadata field (`feature`) used for filtering,
/// if the document carries one.
fn indexed_filter_value(document: &Value) -> Option<String> {
    document
        .get("feature")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
