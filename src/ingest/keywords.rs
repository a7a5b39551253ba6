//! Frequency-based keyword extraction shared by both enrichment fallback paths:
//! unigram + boosted-bigram scoring over a baseline stopword list, matching what the
//! enrichment services fall back to when the LLM is unavailable or its output is too thin.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "let",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only",
    "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[a-zA-Z0-9\-']+\b").expect("static pattern is valid"))
}

/// Ranks unigrams by frequency and bigrams by `frequency * 1.4`, returning the top
/// `max_keywords` distinct terms. Falls back to the first `max_keywords` non-stopwords in
/// original order if scoring produces nothing (degenerate input).
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let words: Vec<String> = word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect();

    let filtered: Vec<&String> = words
        .iter()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(&w.as_str()))
        .collect();

    let mut candidates: HashMap<String, f32> = HashMap::new();
    for w in &filtered {
        *candidates.entry((*w).clone()).or_insert(0.0) += 1.0;
    }
    for pair in filtered.windows(2) {
        let bigram = format!("{} {}", pair[0], pair[1]);
        *candidates.entry(bigram).or_insert(0.0) += 1.4;
    }

    let mut sorted: Vec<(String, f32)> = candidates.into_iter().collect();
    sorted.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut keywords: Vec<String> = sorted.into_iter().map(|(k, _)| k).take(max_keywords).collect();

    if keywords.is_empty() {
        keywords = words
            .into_iter()
            .filter(|w| !STOPWORDS.contains(&w.as_str()))
            .take(max_keywords)
            .collect();
    }

    let mut seen = std::collections::HashSet::new();
    keywords.retain(|k| seen.insert(k.clone()));
    keywords
}

/// Builds a fallback summary from `description` and `steps` by taking the first
/// `max_sentences` sentences of their concatenation, widening to one more sentence if the
/// result reads too short, and hard-capping at 800 chars.
pub fn build_fallback_summary(description: &str, steps: &str, max_sentences: usize) -> String {
    let mut text = description.trim().to_string();
    if !steps.trim().is_empty() {
        text = format!("{text}\n\n{}", steps.trim());
    }

    let sentence_pattern = sentence_boundary();
    let sentences: Vec<&str> = sentence_pattern
        .find_iter(text.trim())
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        return if text.is_empty() {
            "Summary not available.".to_string()
        } else {
            let truncated: String = text.chars().take(500).collect();
            format!("{truncated}...")
        };
    }

    let mut summary = sentences[..max_sentences.min(sentences.len())].join(" ");
    if summary.len() < 40 && sentences.len() > max_sentences {
        let widened = (max_sentences + 1).min(sentences.len());
        summary = sentences[..widened].join(" ");
    }

    let mut truncated: String = summary.chars().take(800).collect();
    if summary.chars().count() >= 800 {
        truncated.push_str("...");
    }
    truncated
}

fn sentence_boundary() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^.!?]+[.!?]*").expect("static pattern is valid"))
}
