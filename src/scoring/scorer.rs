//! Fuses ANN score, per-field cosine similarity and lexical boosts into one ranking score,
//! in two selectable variants.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::query::RankingVariant;
use crate::record::Record;

use super::error::ScoringError;
use super::types::Candidate;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[\w\-']+\b").expect("static token pattern is valid"))
}

fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A single ANN hit as seen by the scorer, before any derived fields are computed.
pub struct ScoringInput {
    pub id: String,
    pub ann_score: f32,
    pub record: Record,
}

/// Stateless fuser of ANN hits into ranked, normalized [`Candidate`]s.
#[derive(Debug, Clone, Copy)]
pub struct CandidateScorer {
    pub candidates_to_retrieve: usize,
}

impl CandidateScorer {
    pub fn new(candidates_to_retrieve: usize) -> Self {
        Self {
            candidates_to_retrieve,
        }
    }

    /// Scores and ranks `hits` against `query_vector`/`expansion_tokens`, dropping any
    /// candidate whose stored vectors don't match the query vector's dimensionality.
    pub fn score(
        &self,
        query_vector: &[f32],
        expansion_tokens: &[String],
        variant: RankingVariant,
        hits: Vec<ScoringInput>,
    ) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(hits.len());

        for hit in hits {
            match self.score_one(query_vector, expansion_tokens, variant, hit) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => warn!(error = %e, "dropping candidate from scoring"),
            }
        }

        Self::normalize(&mut candidates);
        candidates.sort_by(|a, b| {
            b.sort_key()
                .partial_cmp(&a.sort_key())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(self.candidates_to_retrieve);
        candidates
    }

    fn score_one(
        &self,
        query_vector: &[f32],
        expansion_tokens: &[String],
        variant: RankingVariant,
        hit: ScoringInput,
    ) -> Result<Candidate, ScoringError> {
        let ScoringInput {
            id,
            ann_score,
            record,
        } = hit;

        let sim_main = cosine(query_vector, &record.core.main_vec, &id)?;
        let sim_summary = cosine(query_vector, &record.core.summary_vec, &id)?;
        let sim_body = cosine(query_vector, &record.core.body_vec, &id)?;
        let semantic_max = sim_main.max(sim_summary).max(sim_body);

        let keywords: Vec<String> = record
            .core
            .documentation
            .keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        let keyword_overlap = expansion_tokens
            .iter()
            .filter(|t| keywords.contains(t))
            .count();

        let text_tokens: std::collections::HashSet<String> = tokenize(&format!(
            "{} {} {}",
            record.core.name, record.core.body, record.core.documentation.summary
        ))
        .into_iter()
        .collect();

        let mut token_boost = 0.0_f32;
        for token in expansion_tokens {
            if text_tokens.contains(token) {
                token_boost += 0.10;
            }
            if keywords.contains(token) {
                token_boost += 0.15;
            }
        }
        let cap = 0.15 * expansion_tokens.len() as f32;
        token_boost = token_boost.min(cap);

        let raw_score = match variant {
            RankingVariant::A => 0.60 * ann_score + 0.25 * semantic_max + token_boost,
            RankingVariant::B => {
                let overlap_term = (keyword_overlap.min(5) as f32) / 5.0;
                let feature_match = match record.flavor.feature() {
                    Some(feature) => {
                        let feature = feature.to_lowercase();
                        if expansion_tokens.iter().any(|tok| feature.contains(tok.as_str())) {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    None => 0.0,
                };
                let popularity_term = (record.flavor.popularity() / 100.0).min(0.10);
                0.45 * ann_score
                    + 0.20 * semantic_max
                    + 0.12 * overlap_term
                    + 0.08 * feature_match
                    + 0.05 * token_boost
                    + 0.05 * popularity_term
            }
        };

        Ok(Candidate {
            id,
            record,
            ann_score,
            sim_main,
            sim_summary,
            sim_body,
            semantic_max,
            keyword_overlap,
            token_boost,
            raw_score,
            normalized_score: raw_score,
        })
    }

    fn normalize(candidates: &mut [Candidate]) {
        if candidates.is_empty() {
            return;
        }
        let min = candidates
            .iter()
            .map(|c| c.raw_score)
            .fold(f32::INFINITY, f32::min);
        let max = candidates
            .iter()
            .map(|c| c.raw_score)
            .fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;

        if range < 1e-12 {
            for c in candidates.iter_mut() {
                c.normalized_score = 1.0;
            }
            return;
        }

        for c in candidates.iter_mut() {
            c.normalized_score = (c.raw_score - min) / range;
        }
    }
}

fn cosine(a: &[f32], b: &[f32], id: &str) -> Result<f32, ScoringError> {
    if a.is_empty() || b.is_empty() {
        return Ok(0.0);
    }
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            id: id.to_string(),
            expected: a.len(),
            got: b.len(),
        });
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}
