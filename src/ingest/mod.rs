//! Ingestion enricher: turns a raw method body or test-case description into a fully
//! documented, embedded [`Record`], via an LLM enrichment pass with a regex/frequency-based
//! fallback chain when the LLM is disabled or misbehaves.

pub mod error;
pub mod keywords;
pub mod madl;
pub mod signature;

pub use error::IngestError;

use std::collections::HashMap;

use tracing::warn;

use crate::embedding::Encoder;
use crate::llm::{LlmClient, LlmGateway};
use crate::record::Documentation;

const MAX_KEYWORDS: usize = 15;

/// Everything needed to build a Method-flavored [`crate::record::RecordFlavor`] block, plus
/// the shared [`Documentation`].
#[derive(Debug, Clone)]
pub struct MethodEnrichment {
    pub name: String,
    pub documentation: Documentation,
    pub applies: Option<String>,
    pub returns: Option<String>,
    pub example_usage: Option<String>,
    pub owner: Option<String>,
}

fn fallback_method_enrichment(raw_body: &str) -> MethodEnrichment {
    let signature = signature::extract_signature(raw_body);
    let params = signature::extract_params(raw_body);
    let mut doc = Documentation {
        summary: "Automation utility method.".to_string(),
        description: "Generic helper function used in an automation workflow.".to_string(),
        intent: "Perform a browser automation task.".to_string(),
        params,
        keywords: keywords::extract_keywords(raw_body, MAX_KEYWORDS),
        owner: None,
        reusable: true,
    };
    doc.clamp_summary();
    doc.clamp_keywords();

    MethodEnrichment {
        name: signature.clone(),
        documentation: doc,
        applies: Some("Web elements and browser actions".to_string()),
        returns: Some("void".to_string()),
        example_usage: Some(signature),
        owner: None,
    }
}

/// Enriches a raw method body into a full [`MethodEnrichment`]. Always computes the regex
/// fallback first; if a gateway is configured, asks the LLM for a MADL JSON block and uses
/// it only when it parses and carries both `method_name` and `method_documentation`.
pub async fn enrich_method<C: LlmClient>(
    raw_body: &str,
    gateway: Option<&LlmGateway<C>>,
    prompt_template: &str,
) -> MethodEnrichment {
    let fallback = fallback_method_enrichment(raw_body);

    let Some(gateway) = gateway else {
        return fallback;
    };

    let prompt = prompt_template.replace("{source}", raw_body);
    let response = match gateway.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "method MADL generation failed, using regex fallback");
            return fallback;
        }
    };

    let Some(value) = madl::parse_json_loosely(&response) else {
        return fallback;
    };
    if !madl::looks_like_method_madl(&value) {
        return fallback;
    }

    parse_method_madl_value(value).unwrap_or(fallback)
}

fn parse_method_madl_value(value: serde_json::Value) -> Option<MethodEnrichment> {
    let name = value.get("method_name")?.as_str()?.to_string();
    let doc_value = value.get("method_documentation")?;

    let summary = doc_value.get("summary")?.as_str().unwrap_or_default().to_string();
    let description = doc_value
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let intent = doc_value
        .get("intent")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let reusable = doc_value.get("reusable").and_then(|v| v.as_bool()).unwrap_or(true);
    let owner = doc_value
        .get("owner")
        .and_then(|v| v.as_str())
        .map(String::from);
    let applies = doc_value
        .get("applies")
        .and_then(|v| v.as_str())
        .map(String::from);
    let returns = doc_value
        .get("returns")
        .and_then(|v| v.as_str())
        .map(String::from);
    let example_usage = doc_value
        .get("example_usage")
        .and_then(|v| v.as_str())
        .map(String::from);

    let keywords: Vec<String> = doc_value
        .get("keywords")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .take(MAX_KEYWORDS)
                .collect()
        })
        .unwrap_or_default();

    let params: HashMap<String, String> = doc_value
        .get("params")
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let mut documentation = Documentation {
        summary,
        description,
        intent,
        params,
        keywords,
        owner: owner.clone(),
        reusable,
    };
    documentation.clamp_summary();
    documentation.clamp_keywords();

    Some(MethodEnrichment {
        name,
        documentation,
        applies,
        returns,
        example_usage,
        owner,
    })
}

/// Enriches a test-case description into a summary + keyword list, sharing the same MADL
/// prompt template as method enrichment. Accepts either a JSON `{summary, keywords}` reply
/// or free-text `Summary:`/`Keywords:` lines, since a MADL-tuned prompt may answer either way.
#[derive(Debug, Clone)]
pub struct TestCaseEnrichment {
    pub summary: String,
    pub keywords: Vec<String>,
}

pub async fn enrich_testcase<C: LlmClient>(
    description: &str,
    steps: &str,
    gateway: Option<&LlmGateway<C>>,
    prompt_template: &str,
) -> TestCaseEnrichment {
    let fallback_summary = keywords::build_fallback_summary(description, steps, 2);
    let fallback_keywords = keywords::extract_keywords(
        &format!("{description} {steps} {fallback_summary}"),
        MAX_KEYWORDS,
    );

    let Some(gateway) = gateway else {
        return TestCaseEnrichment {
            summary: fallback_summary,
            keywords: fallback_keywords,
        };
    };

    let source = format!("Description: {description}\nSteps: {steps}");
    let prompt = prompt_template.replace("{source}", &source);

    let response = match gateway.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "test case enrichment failed, using fallback summary");
            return TestCaseEnrichment {
                summary: fallback_summary,
                keywords: fallback_keywords,
            };
        }
    };

    let (mut summary, mut parsed_keywords) = match madl::parse_json_loosely(&response) {
        Some(value) => (
            value
                .get("summary")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            value
                .get("keywords")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(String::from))
                        .take(MAX_KEYWORDS)
                        .collect()
                })
                .unwrap_or_default(),
        ),
        None => madl::parse_summary_keywords_text(&response),
    };
    if parsed_keywords.is_empty() {
        parsed_keywords = keywords::extract_keywords(&response, MAX_KEYWORDS);
    }

    if summary.is_empty() {
        summary = fallback_summary;
    }
    if parsed_keywords.len() < 3 {
        let mut merged = parsed_keywords;
        for k in fallback_keywords {
            if !merged.contains(&k) {
                merged.push(k);
            }
        }
        merged.truncate(MAX_KEYWORDS);
        parsed_keywords = merged;
    }

    TestCaseEnrichment {
        summary,
        keywords: parsed_keywords,
    }
}

/// The four travel-together embedding vectors for a record.
#[derive(Debug, Clone)]
pub struct ComputedVectors {
    pub summary_vec: Vec<f32>,
    pub body_vec: Vec<f32>,
    pub doc_vec: Vec<f32>,
    pub main_vec: Vec<f32>,
}

/// Method `main_vec` is the concatenated encoding of summary + body, not their mean;
/// a Method's identity is dominated by what it *does*, and concatenation keeps that signal
/// undiluted relative to averaging in a less-discriminative summary-only passage.
pub fn compute_method_vectors(
    encoder: &Encoder,
    summary: &str,
    body: &str,
    doc_text: &str,
) -> ComputedVectors {
    let summary_vec = encoder.encode(summary);
    let body_vec = encoder.encode(body);
    let doc_vec = encoder.encode(doc_text);
    let main_vec = encoder.encode(&format!("{summary} {body}"));

    ComputedVectors {
        summary_vec,
        body_vec,
        doc_vec,
        main_vec,
    }
}

/// TestCase `main_vec` is the mean of the three field vectors, since a test case's
/// relevance is spread evenly across its description, its steps, and its summary.
pub fn compute_testcase_vectors(
    encoder: &Encoder,
    summary: &str,
    steps: &str,
    doc_text: &str,
) -> ComputedVectors {
    let summary_vec = encoder.encode(summary);
    let body_vec = encoder.encode(steps);
    let doc_vec = encoder.encode(doc_text);
    let main_vec = mean_vector(&[&summary_vec, &body_vec, &doc_vec]);

    ComputedVectors {
        summary_vec,
        body_vec,
        doc_vec,
        main_vec,
    }
}

fn mean_vector(vectors: &[&Vec<f32>]) -> Vec<f32> {
    let non_empty: Vec<&&Vec<f32>> = vectors.iter().filter(|v| !v.is_empty()).collect();
    let Some(dim) = non_empty.first().map(|v| v.len()) else {
        return Vec::new();
    };

    let mut sum = vec![0.0_f32; dim];
    for v in &non_empty {
        if v.len() != dim {
            continue;
        }
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let count = non_empty.len() as f32;
    sum.into_iter().map(|x| x / count).collect()
}
