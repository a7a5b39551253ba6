//! Dedupe pipeline: summarize an incoming record's intent, search the vector store for
//! near neighbors, then ask the LLM for a one-word verdict. Fails open to `Unique` on any
//! ambiguity so a flaky LLM never silently drops data.

use tracing::warn;

use crate::embedding::Encoder;
use crate::llm::{LlmClient, LlmGateway};
use crate::record::{Record, RecordCore};
use crate::vectordb::{MetadataFilter, VectorDbClient};

const SUMMARY_NUM_CANDIDATES: u64 = 50;
const SUMMARY_MATCH_LIMIT: usize = 3;
const FALLBACK_SUMMARY_MAX_CHARS: usize = 80;

/// The dedupe classification for an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeVerdict {
    Duplicate,
    Unique,
}

impl DedupeVerdict {
    pub fn should_insert(&self) -> bool {
        matches!(self, DedupeVerdict::Unique)
    }
}

/// Requests a strict 12-word intent summary from the LLM. Falls back to a whitespace-
/// collapsed, 80-char truncation of `description + steps` on any failure or on a
/// suspiciously short reply (fewer than 8 words).
pub async fn summarize<C: LlmClient>(
    core: &RecordCore,
    gateway: Option<&LlmGateway<C>>,
    prompt_template: &str,
) -> String {
    let fallback = fallback_summary(core);

    let Some(gateway) = gateway else {
        return fallback;
    };

    let prompt = prompt_template
        .replace("{description}", &core.documentation.description)
        .replace("{steps}", &core.body);

    match gateway.generate(&prompt).await {
        Ok(text) => {
            let word_count = text.split_whitespace().count();
            if word_count >= 8 {
                text.split_whitespace()
                    .take(12)
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                fallback
            }
        }
        Err(e) => {
            warn!(error = %e, "dedupe summarization failed, using fallback summary");
            fallback
        }
    }
}

fn fallback_summary(core: &RecordCore) -> String {
    let combined = format!("{} {}", core.documentation.description, core.body);
    let collapsed: String = combined.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(FALLBACK_SUMMARY_MAX_CHARS).collect()
}

/// Encodes `summary` and queries the vector store's `main_vec` path for up to
/// [`SUMMARY_MATCH_LIMIT`] near neighbors, unfiltered.
pub async fn search_near_duplicates<V: VectorDbClient>(
    summary: &str,
    encoder: &Encoder,
    store: &V,
    collection: &str,
) -> Vec<Record> {
    let vector = encoder.encode(summary);
    if vector.is_empty() {
        return Vec::new();
    }

    let hits = match store
        .search(collection, vector, SUMMARY_NUM_CANDIDATES, None::<MetadataFilter>)
        .await
    {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "dedupe near-duplicate search failed, treating as no matches");
            return Vec::new();
        }
    };

    hits.into_iter()
        .take(SUMMARY_MATCH_LIMIT)
        .filter_map(|hit| serde_json::from_value(hit.document).ok())
        .collect()
}

/// Classifies `new_record` against up to 3 `matches` using the flavor-appropriate prompt
/// template. Fail-open: missing gateway, empty matches, call failure, or an ambiguous
/// reply all resolve to [`DedupeVerdict::Unique`].
pub async fn verify<C: LlmClient>(
    new_record: &Record,
    matches: &[Record],
    gateway: Option<&LlmGateway<C>>,
    method_prompt_template: &str,
    testcase_prompt_template: &str,
) -> DedupeVerdict {
    if matches.is_empty() {
        return DedupeVerdict::Unique;
    }
    let Some(gateway) = gateway else {
        return DedupeVerdict::Unique;
    };

    let template = if new_record.flavor.is_method() {
        method_prompt_template
    } else {
        testcase_prompt_template
    };

    let new_record_json = serde_json::to_string(new_record).unwrap_or_default();
    let matches_json = serde_json::to_string(matches).unwrap_or_default();
    let prompt = template
        .replace("{new_record}", &new_record_json)
        .replace("{matches}", &matches_json);

    let response = match gateway.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "dedupe verification failed, defaulting to unique");
            return DedupeVerdict::Unique;
        }
    };

    classify(&response)
}

fn classify(response: &str) -> DedupeVerdict {
    let upper = response.to_uppercase();
    if upper.contains("DUPLICATE") {
        DedupeVerdict::Duplicate
    } else {
        DedupeVerdict::Unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::SinterConfig;
    use crate::llm::MockLlmClient;
    use crate::record::{Documentation, RecordFlavor};
    use crate::vectordb::MockVectorDbClient;
    use chrono::Utc;
    use std::time::Duration;

    fn gateway(mock: MockLlmClient) -> LlmGateway<MockLlmClient> {
        LlmGateway::new(mock, "test-model", 4, 0, Duration::from_millis(1))
    }

    fn core() -> RecordCore {
        RecordCore {
            id: "m-1".into(),
            name: "clickSubmitButton".into(),
            body: "driver.findElement(By.id(\"submit\")).click();".into(),
            documentation: Documentation {
                description: "Clicks the submit button on the checkout form".into(),
                ..Default::default()
            },
            created: Utc::now(),
            last_updated: Utc::now(),
            summary_vec: vec![],
            body_vec: vec![],
            doc_vec: vec![],
            main_vec: vec![],
        }
    }

    fn record() -> Record {
        Record {
            core: core(),
            flavor: RecordFlavor::Method {
                applies: None,
                returns: None,
                example_usage: None,
                owner: None,
            },
        }
    }

    #[tokio::test]
    async fn summarize_without_gateway_uses_fallback() {
        let summary = summarize::<MockLlmClient>(&core(), None, "{description}{steps}").await;
        assert!(summary.len() <= FALLBACK_SUMMARY_MAX_CHARS);
        assert!(summary.contains("Clicks the submit button"));
    }

    #[tokio::test]
    async fn summarize_rejects_short_llm_replies() {
        let mock = MockLlmClient::with_responses(["too short"]);
        let gw = gateway(mock);
        let summary = summarize(&core(), Some(&gw), "{description} {steps}").await;
        assert!(summary.contains("Clicks the submit button"));
    }

    #[tokio::test]
    async fn summarize_truncates_long_llm_replies_to_12_words() {
        let mock = MockLlmClient::with_responses([
            "one two three four five six seven eight nine ten eleven twelve thirteen fourteen",
        ]);
        let gw = gateway(mock);
        let summary = summarize(&core(), Some(&gw), "{description} {steps}").await;
        assert_eq!(summary.split_whitespace().count(), 12);
    }

    #[tokio::test]
    async fn empty_matches_is_unique_without_calling_llm() {
        let mock = MockLlmClient::new();
        mock.push_failure("should not be called");
        let gw = gateway(mock);
        let verdict = verify(&record(), &[], Some(&gw), "{new_record}{matches}", "{new_record}{matches}").await;
        assert_eq!(verdict, DedupeVerdict::Unique);
        assert_eq!(gw.generate("x").await.is_err(), true);
    }

    #[tokio::test]
    async fn duplicate_keyword_in_reply_classifies_as_duplicate() {
        let mock = MockLlmClient::with_responses(["DUPLICATE"]);
        let gw = gateway(mock);
        let verdict = verify(
            &record(),
            &[record()],
            Some(&gw),
            "{new_record}{matches}",
            "{new_record}{matches}",
        )
        .await;
        assert_eq!(verdict, DedupeVerdict::Duplicate);
    }

    #[tokio::test]
    async fn ambiguous_reply_fails_open_to_unique() {
        let mock = MockLlmClient::with_responses(["not sure about this one"]);
        let gw = gateway(mock);
        let verdict = verify(
            &record(),
            &[record()],
            Some(&gw),
            "{new_record}{matches}",
            "{new_record}{matches}",
        )
        .await;
        assert_eq!(verdict, DedupeVerdict::Unique);
    }

    #[tokio::test]
    async fn llm_unreachable_fails_open_to_unique() {
        let mock = MockLlmClient::new();
        mock.push_failure("down");
        let gw = gateway(mock);
        let verdict = verify(
            &record(),
            &[record()],
            Some(&gw),
            "{new_record}{matches}",
            "{new_record}{matches}",
        )
        .await;
        assert_eq!(verdict, DedupeVerdict::Unique);
    }

    #[tokio::test]
    async fn search_encodes_summary_and_queries_store() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = MockVectorDbClient::new();
        store.ensure_collection("records", 8).await.unwrap();
        let vector = encoder.encode("clicks the submit button");
        let document = serde_json::to_value(record()).unwrap();
        store
            .upsert_points(
                "records",
                vec![crate::vectordb::VectorPoint::new("m-1", vector, document)],
                crate::vectordb::WriteConsistency::Strong,
            )
            .await
            .unwrap();

        let matches = search_near_duplicates(
            "clicks the submit button",
            &encoder,
            &store,
            "records",
        )
        .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].core.id, "m-1");
    }
}
