//! Pairwise reranker: an LLM-driven reordering of the top scored candidates by relevance
//! to the original query, shaped after the teacher's cross-encoder `Reranker`'s
//! load/stub split — here the "model" path calls through the LLM gateway instead of a
//! local cross-encoder, and the "stub" path keeps the teacher's Jaccard/recall placeholder
//! idiom so reordering stays exercisable without a live LLM.

use std::collections::HashSet;

use tracing::warn;

use crate::llm::{LlmClient, LlmGateway};
use crate::scoring::Candidate;

const MAX_SUMMARY_SNIPPET: usize = 220;

/// Reorders `candidates` by asking the LLM Gateway for a relevance-ordered list of IDs.
/// Short-circuits unchanged when disabled or there's nothing to reorder; any failure
/// (call error, unparseable response) also returns the input unchanged.
pub async fn rerank<C: LlmClient>(
    query: &str,
    candidates: Vec<Candidate>,
    gateway: Option<&LlmGateway<C>>,
    rerank_enabled: bool,
    prompt_template: &str,
) -> Vec<Candidate> {
    if !rerank_enabled || candidates.len() <= 1 {
        return candidates;
    }
    let Some(gateway) = gateway else {
        return candidates;
    };

    let prompt = build_prompt(prompt_template, &candidates);

    match gateway.generate(&prompt).await {
        Ok(response) => reorder_by_response(&response, candidates),
        Err(e) => {
            warn!(error = %e, "pairwise rerank failed, keeping original order");
            candidates
        }
    }
}

fn build_prompt(template: &str, candidates: &[Candidate]) -> String {
    let lines: Vec<String> = candidates
        .iter()
        .map(|c| {
            let summary = &c.record.core.documentation.summary;
            let snippet: String = summary.chars().take(MAX_SUMMARY_SNIPPET).collect();
            format!("{} | {} | Summary: {}", c.id, c.record.core.name, snippet)
        })
        .collect();
    template.replace("{candidates}", &lines.join("\n"))
}

fn reorder_by_response(response: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let order: Vec<String> = response
        .lines()
        .filter_map(extract_id_token)
        .collect();

    if order.is_empty() {
        return candidates;
    }

    let mut remaining: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
    let mut reordered = Vec::with_capacity(remaining.len());

    for id in &order {
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|c| &c.id == id))
        {
            reordered.push(slot.take().unwrap());
        }
    }

    // Stability fallback: anything the LLM didn't mention is appended in original order.
    reordered.extend(remaining.into_iter().flatten());

    reordered
}

fn extract_id_token(line: &str) -> Option<String> {
    let token = line.trim().split_whitespace().next()?;
    let cleaned: String = token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
        .to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Deterministic, LLM-free reordering using the teacher's Jaccard/recall placeholder
/// scoring idiom, for tests that want predictable rerank behavior without a mock client.
pub fn rerank_stub(query: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
    let query_tokens = content_tokens(query);

    let mut scored: Vec<(f32, Candidate)> = candidates
        .into_iter()
        .map(|c| {
            let text = format!("{} {}", c.record.core.name, c.record.core.documentation.summary);
            let score = placeholder_score(&query_tokens, &content_tokens(&text));
            (score, c)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, c)| c).collect()
}

fn content_tokens(text: &str) -> HashSet<String> {
    const STOP_WORDS: &[&str] = &[
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "to", "of", "in", "for", "on",
        "with", "at", "by", "from", "and", "or", "this", "that",
    ];
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(String::from)
        .collect()
}

fn placeholder_score(query_tokens: &HashSet<String>, candidate_tokens: &HashSet<String>) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let matches = query_tokens.intersection(candidate_tokens).count();
    let recall = matches as f32 / query_tokens.len() as f32;
    let union = query_tokens.union(candidate_tokens).count();
    let jaccard = if union > 0 {
        matches as f32 / union as f32
    } else {
        0.0
    };
    0.6 * recall + 0.4 * jaccard
}
