use crate::vectordb::client::MetadataFilter;
use crate::vectordb::{SearchHit, VectorDbClient, VectorDbError, VectorPoint, WriteConsistency};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory [`VectorDbClient`] for tests: exact brute-force cosine search over whatever was
/// upserted, no real ANN index.
#[derive(Default)]
pub struct MockVectorDbClient {
    collections: RwLock<HashMap<String, MockCollection>>,
}

#[derive(Default, Clone)]
struct MockCollection {
    vector_size: u64,
    points: HashMap<String, VectorPoint>,
}

impl MockVectorDbClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.points.len())
    }
}

impl VectorDbClient for MockVectorDbClient {
    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::CreateCollectionFailed {
                    collection: name.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        collections
            .entry(name.to_string())
            .or_insert(MockCollection {
                vector_size,
                points: HashMap::new(),
            });

        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
        _consistency: WriteConsistency,
    ) -> Result<(), VectorDbError> {
        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::UpsertFailed {
                    collection: collection.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        let coll = collections
            .entry(collection.to_string())
            .or_insert_with(|| MockCollection {
                vector_size: points.first().map(|p| p.main_vec.len() as u64).unwrap_or(0),
                points: HashMap::new(),
            });

        for point in points {
            if coll.vector_size != 0 && point.main_vec.len() as u64 != coll.vector_size {
                return Err(VectorDbError::InvalidDimension {
                    expected: coll.vector_size as usize,
                    actual: point.main_vec.len(),
                });
            }
            coll.points.insert(point.id.clone(), point);
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        num_candidates: u64,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<SearchHit>, VectorDbError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "lock poisoned".to_string(),
            })?;

        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<SearchHit> = coll
            .points
            .values()
            .filter(|p| match &filter {
                None => true,
                Some(MetadataFilter { field, value }) => p
                    .document
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(|v| v == value)
                    .unwrap_or(false),
            })
            .map(|p| SearchHit {
                id: p.id.clone(),
                score: cosine_similarity(&query, &p.main_vec),
                document: p.document.clone(),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(num_candidates as usize);
        Ok(results)
    }

    async fn delete_points(&self, collection: &str, ids: Vec<String>) -> Result<(), VectorDbError> {
        let mut collections =
            self.collections
                .write()
                .map_err(|_| VectorDbError::DeleteFailed {
                    collection: collection.to_string(),
                    message: "lock poisoned".to_string(),
                })?;

        if let Some(coll) = collections.get_mut(collection) {
            for id in ids {
                coll.points.remove(&id);
            }
        }

        Ok(())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
