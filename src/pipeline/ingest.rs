//! The ingestion path: Ingestion Enricher (MADL + four-vector embedding) → Dedupe Pipeline
//! → conditional insert. Also hosts the update path, which is the only way a stored
//! record's vectors may change.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dedupe;
use crate::embedding::Encoder;
use crate::ingest::{self, ComputedVectors};
use crate::llm::{LlmClient, LlmGateway};
use crate::record::{Documentation, Record, RecordCore, RecordFlavor};
use crate::vectordb::{VectorDbClient, VectorPoint, WriteConsistency};

use super::error::PipelineError;

/// Raw input describing a record not yet known to the system.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum RawRecordInput {
    Method {
        id: String,
        raw_body: String,
    },
    TestCase {
        id: String,
        description: String,
        steps: String,
        #[serde(default)]
        feature: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        priority: Option<String>,
        #[serde(default)]
        platform: Option<String>,
        #[serde(default)]
        popularity: Option<f32>,
    },
}

/// Outcome of running a raw record through the ingestion pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Inserted { record: Record },
    SkippedDuplicate { id: String, matched_id: Option<String> },
}

/// Enriches, embeds, dedupes, and (if unique) persists a raw record.
pub async fn ingest<C: LlmClient, V: VectorDbClient>(
    input: RawRecordInput,
    encoder: &Encoder,
    gateway: Option<&LlmGateway<C>>,
    store: &V,
    collection: &str,
    prompts: &crate::config::PromptTemplates,
    now: DateTime<Utc>,
) -> Result<IngestOutcome, PipelineError> {
    let record = match input {
        RawRecordInput::Method { id, raw_body } => {
            let enrichment = ingest::enrich_method(&raw_body, gateway, &prompts.madl).await;
            let doc_text = enrichment.documentation.to_embedding_text();
            let vectors = ingest::compute_method_vectors(
                encoder,
                &enrichment.documentation.summary,
                &raw_body,
                &doc_text,
            );
            build_record(
                id,
                enrichment.name,
                raw_body,
                enrichment.documentation,
                RecordFlavor::Method {
                    applies: enrichment.applies,
                    returns: enrichment.returns,
                    example_usage: enrichment.example_usage,
                    owner: enrichment.owner,
                },
                vectors,
                now,
            )?
        }
        RawRecordInput::TestCase {
            id,
            description,
            steps,
            feature,
            tags,
            priority,
            platform,
            popularity,
        } => {
            let enrichment =
                ingest::enrich_testcase(&description, &steps, gateway, &prompts.madl).await;
            let documentation = Documentation {
                summary: enrichment.summary,
                description: description.clone(),
                intent: String::new(),
                params: HashMap::new(),
                keywords: enrichment.keywords,
                owner: None,
                reusable: false,
            };
            let doc_text = documentation.to_embedding_text();
            let vectors = ingest::compute_testcase_vectors(
                encoder,
                &documentation.summary,
                &steps,
                &doc_text,
            );
            build_record(
                id,
                description.clone(),
                steps,
                documentation,
                RecordFlavor::TestCase {
                    feature,
                    prerequisites: None,
                    tags,
                    priority,
                    platform,
                    popularity,
                },
                vectors,
                now,
            )?
        }
    };

    let summary = dedupe::summarize(&record.core, gateway, &prompts.dedupe_summary).await;
    let matches =
        dedupe::search_near_duplicates(&summary, encoder, store, collection).await;
    let verdict = dedupe::verify(
        &record,
        &matches,
        gateway,
        &prompts.dedupe_verification_method,
        &prompts.dedupe_verification_testcase,
    )
    .await;

    if !verdict.should_insert() {
        return Ok(IngestOutcome::SkippedDuplicate {
            id: record.core.id,
            matched_id: matches.first().map(|m| m.core.id.clone()),
        });
    }

    let document = serde_json::to_value(&record).unwrap_or(serde_json::Value::Null);
    let point = VectorPoint::new(record.core.id.clone(), record.core.main_vec.clone(), document);
    store
        .upsert_points(collection, vec![point], WriteConsistency::Strong)
        .await?;

    Ok(IngestOutcome::Inserted { record })
}

fn build_record(
    id: String,
    name: String,
    body: String,
    documentation: Documentation,
    flavor: RecordFlavor,
    vectors: ComputedVectors,
    now: DateTime<Utc>,
) -> Result<Record, PipelineError> {
    let mut core = RecordCore {
        id,
        name,
        body,
        documentation,
        created: now,
        last_updated: now,
        summary_vec: vectors.summary_vec,
        body_vec: vectors.body_vec,
        doc_vec: vectors.doc_vec,
        main_vec: vectors.main_vec,
    };

    if !core.has_complete_vectors() {
        return Err(PipelineError::RecordEmbeddingIncomplete);
    }
    core.documentation.clamp_summary();
    core.documentation.clamp_keywords();

    Ok(Record { core, flavor })
}

/// Fields an update may change; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordUpdate {
    pub name: Option<String>,
    pub body: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub intent: Option<String>,
    pub params: Option<HashMap<String, String>>,
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("record update left a record with incomplete vectors")]
    IncompleteVectors,
}

/// Applies `update` to `record`. Re-embeds all four vector fields whenever the body,
/// summary, params, or keywords actually change; `name`, `description`, and `intent`
/// changes alone don't trigger re-embedding. `created` is always preserved; `last_updated`
/// is always bumped to `now`.
pub fn apply_update(
    mut record: Record,
    update: RecordUpdate,
    encoder: &Encoder,
    now: DateTime<Utc>,
) -> Result<Record, UpdateError> {
    let is_method = record.flavor.is_method();
    let mut semantic_changed = false;

    if let Some(body) = update.body {
        if body != record.core.body {
            record.core.body = body;
            semantic_changed = true;
        }
    }
    if let Some(summary) = update.summary {
        if summary != record.core.documentation.summary {
            record.core.documentation.summary = summary;
            semantic_changed = true;
        }
    }
    if let Some(params) = update.params {
        if params != record.core.documentation.params {
            record.core.documentation.params = params;
            semantic_changed = true;
        }
    }
    if let Some(keywords) = update.keywords {
        if keywords != record.core.documentation.keywords {
            record.core.documentation.keywords = keywords;
            semantic_changed = true;
        }
    }
    if let Some(name) = update.name {
        record.core.name = name;
    }
    if let Some(description) = update.description {
        record.core.documentation.description = description;
    }
    if let Some(intent) = update.intent {
        record.core.documentation.intent = intent;
    }

    record.core.documentation.clamp_summary();
    record.core.documentation.clamp_keywords();

    if semantic_changed {
        let doc_text = record.core.documentation.to_embedding_text();
        let vectors = if is_method {
            ingest::compute_method_vectors(
                encoder,
                &record.core.documentation.summary,
                &record.core.body,
                &doc_text,
            )
        } else {
            ingest::compute_testcase_vectors(
                encoder,
                &record.core.documentation.summary,
                &record.core.body,
                &doc_text,
            )
        };
        record.core.set_vectors(
            vectors.summary_vec,
            vectors.body_vec,
            vectors.doc_vec,
            vectors.main_vec,
        );
        if !record.core.has_complete_vectors() {
            return Err(UpdateError::IncompleteVectors);
        }
    }

    record.touch(now);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::SinterConfig;
    use crate::llm::MockLlmClient;
    use crate::vectordb::MockVectorDbClient;

    fn prompts() -> crate::config::PromptTemplates {
        crate::config::PromptTemplates::default()
    }

    #[tokio::test]
    async fn unique_method_is_inserted_and_persisted() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = MockVectorDbClient::new();
        store.ensure_collection("records", encoder.embedding_dim() as u64).await.unwrap();
        let input = RawRecordInput::Method {
            id: "m-1".into(),
            raw_body: "async function clickSubmitButton(page) { await page.click('#submit'); }"
                .into(),
        };
        let outcome = ingest::<MockLlmClient, _>(
            input,
            &encoder,
            None,
            &store,
            "records",
            &prompts(),
            Utc::now(),
        )
        .await
        .unwrap();

        match outcome {
            IngestOutcome::Inserted { record } => {
                assert!(record.core.has_complete_vectors());
                assert_eq!(store.point_count("records"), Some(1));
            }
            IngestOutcome::SkippedDuplicate { .. } => panic!("expected insertion"),
        }
    }

    #[tokio::test]
    async fn duplicate_verdict_skips_insert() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = MockVectorDbClient::new();
        store.ensure_collection("records", encoder.embedding_dim() as u64).await.unwrap();

        let existing = RawRecordInput::Method {
            id: "m-1".into(),
            raw_body: "async function clickSubmitButton(page) { await page.click('#submit'); }"
                .into(),
        };
        let mock = MockLlmClient::new();
        let gw = LlmGateway::new(mock, "test-model", 4, 0, std::time::Duration::from_millis(1));
        ingest(existing, &encoder, Some(&gw), &store, "records", &prompts(), Utc::now())
            .await
            .unwrap();

        let mock2 = MockLlmClient::new();
        mock2.push_text("Clicks the checkout submit button reliably across browsers today");
        mock2.push_text("DUPLICATE");
        let gw2 = LlmGateway::new(mock2, "test-model", 4, 0, std::time::Duration::from_millis(1));
        let incoming = RawRecordInput::Method {
            id: "m-2".into(),
            raw_body: "async function clickSubmitButton(page) { await page.click('#submit'); }"
                .into(),
        };
        let outcome = ingest(incoming, &encoder, Some(&gw2), &store, "records", &prompts(), Utc::now())
            .await
            .unwrap();

        match outcome {
            IngestOutcome::SkippedDuplicate { id, matched_id } => {
                assert_eq!(id, "m-2");
                assert_eq!(matched_id, Some("m-1".to_string()));
            }
            IngestOutcome::Inserted { .. } => panic!("expected duplicate skip"),
        }
        assert_eq!(store.point_count("records"), Some(1));
    }

    #[tokio::test]
    async fn update_changing_only_summary_recomputes_all_four_vectors() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = MockVectorDbClient::new();
        store.ensure_collection("records", encoder.embedding_dim() as u64).await.unwrap();
        let created_at = Utc::now();
        let input = RawRecordInput::Method {
            id: "m-1".into(),
            raw_body: "async function clickSubmitButton(page) { await page.click('#submit'); }"
                .into(),
        };
        let record = match ingest::<MockLlmClient, _>(
            input, &encoder, None, &store, "records", &prompts(), created_at,
        )
        .await
        .unwrap()
        {
            IngestOutcome::Inserted { record } => record,
            _ => panic!("expected insertion"),
        };

        let later = created_at + chrono::Duration::seconds(60);
        let update = RecordUpdate {
            summary: Some("Clicks the checkout submit button".into()),
            ..Default::default()
        };
        let updated = apply_update(record.clone(), update, &encoder, later).unwrap();

        assert_eq!(updated.core.created, created_at);
        assert_eq!(updated.core.last_updated, later);
        assert_ne!(updated.core.summary_vec, record.core.summary_vec);
        assert_ne!(updated.core.main_vec, record.core.main_vec);
        assert!(updated.core.has_complete_vectors());
    }

    #[test]
    fn update_changing_only_name_does_not_reembed() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let core = RecordCore {
            id: "m-1".into(),
            name: "old".into(),
            body: "body".into(),
            documentation: Documentation {
                summary: "summary".into(),
                ..Default::default()
            },
            created: Utc::now(),
            last_updated: Utc::now(),
            summary_vec: vec![0.1, 0.2],
            body_vec: vec![0.1, 0.2],
            doc_vec: vec![0.1, 0.2],
            main_vec: vec![0.1, 0.2],
        };
        let record = Record {
            core,
            flavor: RecordFlavor::Method {
                applies: None,
                returns: None,
                example_usage: None,
                owner: None,
            },
        };
        let update = RecordUpdate {
            name: Some("new".into()),
            ..Default::default()
        };
        let updated = apply_update(record.clone(), update, &encoder, Utc::now()).unwrap();
        assert_eq!(updated.core.name, "new");
        assert_eq!(updated.core.main_vec, record.core.main_vec);
    }
}
