//! Final intent ranker: an LLM-driven top-K selection with 0-100 confidence scores,
//! shaped like the teacher's `CrossEncoderScorer`/`VerificationResult` verify-then-classify
//! idiom, generalized from a binary verified/rejected threshold to a continuous score with
//! carry-forward fill semantics.

use tracing::warn;

use crate::llm::{LlmClient, LlmGateway};

const DEFAULT_CARRIED_PROBABILITY: f32 = 50.0;

/// A single display-ready item entering the final ranking stage.
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Steps (test case) or raw body (method).
    pub steps_or_body: String,
    pub keywords: Vec<String>,
    /// Probability carried in from upstream (e.g. the single-candidate shortcut sets 100);
    /// `None` means "not yet assigned", which carries forward as
    /// [`DEFAULT_CARRIED_PROBABILITY`] if the final ranker doesn't select this item.
    pub probability: Option<f32>,
}

impl RankedItem {
    fn madl_block(&self) -> String {
        format!(
            "{} | {} | {} | {} | {}",
            self.id,
            self.name,
            self.description,
            self.steps_or_body,
            self.keywords.join(", ")
        )
    }

    fn carried_probability(&self) -> f32 {
        self.probability.unwrap_or(DEFAULT_CARRIED_PROBABILITY)
    }
}

/// Ranks `items` via the LLM gateway, asking for exactly `top_k` `<id> | <score>` lines.
/// Any failure (no gateway, call error, unparseable response) returns `items` truncated to
/// `top_k` with whatever probabilities they already carried, unchanged otherwise.
pub async fn rank<C: LlmClient>(
    items: Vec<RankedItem>,
    top_k: usize,
    gateway: Option<&LlmGateway<C>>,
    prompt_template: &str,
) -> Vec<RankedItem> {
    // A single item has nothing to be ranked against; skip the LLM call entirely and
    // report full confidence, per the single-candidate boundary case.
    if items.len() <= 1 {
        let mut items = items;
        for item in items.iter_mut() {
            item.probability = Some(100.0);
        }
        return items;
    }

    let Some(gateway) = gateway else {
        return truncate_unchanged(items, top_k);
    };

    let blocks: Vec<String> = items.iter().map(RankedItem::madl_block).collect();
    let prompt = prompt_template
        .replace("{items}", &blocks.join("\n"))
        .replace("{top_k}", &top_k.to_string());

    let response = match gateway.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "final ranking failed, returning prefix unchanged");
            return truncate_unchanged(items, top_k);
        }
    };

    let parsed = parse_response(&response);
    if parsed.is_empty() {
        return truncate_unchanged(items, top_k);
    }

    apply_ranking(items, top_k, parsed)
}

fn truncate_unchanged(mut items: Vec<RankedItem>, top_k: usize) -> Vec<RankedItem> {
    items.truncate(top_k);
    items
}

fn parse_response(response: &str) -> Vec<(String, f32)> {
    response
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(2, '|');
            let id = parts.next()?.trim();
            let score_str = parts.next()?.trim();
            if id.is_empty() || score_str.is_empty() {
                return None;
            }
            let score: f32 = score_str.parse().ok()?;
            Some((id.to_string(), score.clamp(0.0, 100.0)))
        })
        .collect()
}

fn apply_ranking(
    items: Vec<RankedItem>,
    top_k: usize,
    parsed: Vec<(String, f32)>,
) -> Vec<RankedItem> {
    let mut slots: Vec<Option<RankedItem>> = items.into_iter().map(Some).collect();

    let mut matched = Vec::with_capacity(top_k);
    let mut seen = std::collections::HashSet::new();

    for (id, score) in parsed {
        if matched.len() >= top_k {
            break;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        if let Some(slot) = slots
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|i| i.id == id))
        {
            let mut item = slot.take().unwrap();
            item.probability = Some(score);
            matched.push(item);
        }
    }

    if matched.len() < top_k {
        // Remaining original items, in their original relative order, carrying forward
        // their existing (or default) probability.
        for item in slots.into_iter().flatten() {
            if matched.len() >= top_k {
                break;
            }
            let mut item = item;
            item.probability = Some(item.carried_probability());
            matched.push(item);
        }
    }

    matched.sort_by(|a, b| {
        b.carried_probability()
            .partial_cmp(&a.carried_probability())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    matched
}
