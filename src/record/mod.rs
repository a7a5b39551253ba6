//! The record model: a tagged Method/TestCase union over a shared core.
//!
//! Scoring, reranking, caching and serialization all operate on [`RecordCore`]; enrichment
//! and dedupe prompts read the flavor-specific [`RecordFlavor`] block to fill in per-flavor
//! prompt fields. The four embedding vectors always travel together — see
//! [`RecordCore::has_complete_vectors`] — and travel with the record through storage;
//! [`RecordCore::strip_vectors`] is how a caller keeps them out of a user-facing response.

mod documentation;

pub use documentation::Documentation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Method or TestCase record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(flatten)]
    pub core: RecordCore,
    #[serde(flatten)]
    pub flavor: RecordFlavor,
}

/// Fields shared by every record regardless of flavor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordCore {
    /// Stable opaque identity.
    pub id: String,
    /// Human-readable name/title.
    pub name: String,
    /// Raw method body, or combined test-case steps.
    pub body: String,
    /// Structured documentation block (summary, keywords, params, intent, owner, ...).
    pub documentation: Documentation,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,

    /// Embedding of `documentation.summary`.
    #[serde(default)]
    pub summary_vec: Vec<f32>,
    /// Embedding of `body` (raw method or combined steps).
    #[serde(default)]
    pub body_vec: Vec<f32>,
    /// Embedding of the serialized documentation block.
    #[serde(default)]
    pub doc_vec: Vec<f32>,
    /// Primary ANN path vector.
    #[serde(default)]
    pub main_vec: Vec<f32>,
}

impl RecordCore {
    /// `true` iff all four vectors are present, non-empty, and share one dimensionality.
    pub fn has_complete_vectors(&self) -> bool {
        let dims = [
            self.summary_vec.len(),
            self.body_vec.len(),
            self.doc_vec.len(),
            self.main_vec.len(),
        ];
        dims.iter().all(|&d| d > 0) && dims.iter().all(|&d| d == dims[0])
    }

    /// Strips the vector fields, leaving only what should reach a user-facing API response.
    ///
    /// `Record`'s own `Serialize` impl deliberately carries the vectors — they must
    /// round-trip through the document stored in the vector store, or per-field cosine
    /// similarity has nothing to score against on the next search. The API handlers never
    /// serialize a `Record` directly for that reason (they build `SearchResultItem`/
    /// `IngestResponse` by hand instead); this helper is for any other caller that holds a
    /// `RecordCore` and needs to guarantee the vectors are gone before handing it onward.
    pub fn strip_vectors(mut self) -> Self {
        self.summary_vec = Vec::new();
        self.body_vec = Vec::new();
        self.doc_vec = Vec::new();
        self.main_vec = Vec::new();
        self
    }

    /// Sets all four vectors together, maintaining the all-or-nothing invariant.
    pub fn set_vectors(
        &mut self,
        summary_vec: Vec<f32>,
        body_vec: Vec<f32>,
        doc_vec: Vec<f32>,
        main_vec: Vec<f32>,
    ) {
        self.summary_vec = summary_vec;
        self.body_vec = body_vec;
        self.doc_vec = doc_vec;
        self.main_vec = main_vec;
    }
}

/// Flavor-specific extension block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum RecordFlavor {
    /// An automation method.
    Method {
        /// What the method applies to (page object, selector group, ...).
        applies: Option<String>,
        /// What the method returns.
        returns: Option<String>,
        /// Canned example invocation.
        example_usage: Option<String>,
        /// Owning team/individual.
        owner: Option<String>,
    },
    /// A test case.
    TestCase {
        /// Product feature under test; used as the indexed metadata filter field.
        feature: Option<String>,
        /// Preconditions the test assumes.
        prerequisites: Option<String>,
        tags: Vec<String>,
        priority: Option<String>,
        platform: Option<String>,
        /// Engagement signal used by scoring variant B.
        popularity: Option<f32>,
    },
}

impl RecordFlavor {
    pub fn feature(&self) -> Option<&str> {
        match self {
            RecordFlavor::TestCase { feature, .. } => feature.as_deref(),
            RecordFlavor::Method { .. } => None,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            RecordFlavor::TestCase { tags, .. } => tags.as_slice(),
            RecordFlavor::Method { .. } => &[],
        }
    }

    pub fn priority(&self) -> Option<&str> {
        match self {
            RecordFlavor::TestCase { priority, .. } => priority.as_deref(),
            RecordFlavor::Method { .. } => None,
        }
    }

    pub fn platform(&self) -> Option<&str> {
        match self {
            RecordFlavor::TestCase { platform, .. } => platform.as_deref(),
            RecordFlavor::Method { .. } => None,
        }
    }

    pub fn popularity(&self) -> f32 {
        match self {
            RecordFlavor::TestCase { popularity, .. } => popularity.unwrap_or(0.0),
            RecordFlavor::Method { .. } => 0.0,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, RecordFlavor::Method { .. })
    }
}

impl Record {
    /// Marks the record as updated, bumping `last_updated` but preserving `created`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.core.last_updated = now;
    }

    /// Text searched for keyword/token boosts: name + body + summary, lowercased later by
    /// the scorer's tokenizer.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {}",
            self.core.name, self.core.body, self.core.documentation.summary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_core() -> RecordCore {
        RecordCore {
            id: "m-1".into(),
            name: "clickSubmitButton".into(),
            body: "driver.findElement(By.id(\"submit\")).click();".into(),
            documentation: Documentation::default(),
            created: Utc::now(),
            last_updated: Utc::now(),
            summary_vec: vec![0.1, 0.2],
            body_vec: vec![0.1, 0.2],
            doc_vec: vec![0.1, 0.2],
            main_vec: vec![0.1, 0.2],
        }
    }

    #[test]
    fn complete_vectors_requires_all_four_same_dim() {
        let core = sample_core();
        assert!(core.has_complete_vectors());

        let mut missing_one = core.clone();
        missing_one.doc_vec = Vec::new();
        assert!(!missing_one.has_complete_vectors());

        let mut mismatched = core;
        mismatched.main_vec = vec![0.1, 0.2, 0.3];
        assert!(!mismatched.has_complete_vectors());
    }

    #[test]
    fn strip_vectors_zeroes_all_four() {
        let core = sample_core().strip_vectors();
        assert!(!core.has_complete_vectors());
        assert!(core.summary_vec.is_empty());
        assert!(core.main_vec.is_empty());
    }

    #[test]
    fn serialization_round_trips_vectors_for_storage() {
        // The vectors must survive this round-trip: this is exactly what happens when a
        // record is written as a vector-store document and read back on the next search.
        let record = Record {
            core: sample_core(),
            flavor: RecordFlavor::Method {
                applies: Some("LoginPage".into()),
                returns: None,
                example_usage: None,
                owner: Some("qa-team".into()),
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["summary_vec"], serde_json::json!([0.1, 0.2]));
        assert_eq!(json["main_vec"], serde_json::json!([0.1, 0.2]));
        assert_eq!(json["flavor"], "method");

        let round_tripped: Record = serde_json::from_value(json).unwrap();
        assert!(round_tripped.core.has_complete_vectors());
        assert_eq!(round_tripped.core.main_vec, record.core.main_vec);
    }

    #[test]
    fn stripped_record_never_leaks_vectors_into_json() {
        let core = sample_core().strip_vectors();
        let record = Record {
            core,
            flavor: RecordFlavor::Method {
                applies: None,
                returns: None,
                example_usage: None,
                owner: None,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["summary_vec"], serde_json::json!([]));
        assert_eq!(json["main_vec"], serde_json::json!([]));
    }

    #[test]
    fn touch_preserves_created_bumps_last_updated() {
        let created = Utc::now();
        let mut record = Record {
            core: RecordCore {
                created,
                ..sample_core()
            },
            flavor: RecordFlavor::TestCase {
                feature: Some("checkout".into()),
                prerequisites: None,
                tags: vec![],
                priority: None,
                platform: None,
                popularity: None,
            },
        };
        let later = created + chrono::Duration::seconds(60);
        record.touch(later);
        assert_eq!(record.core.created, created);
        assert_eq!(record.core.last_updated, later);
    }
}
