use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The MADL (Method/Automation Documentation Layer) block attached to every record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Documentation {
    /// ≤35 words.
    pub summary: String,
    pub description: String,
    pub intent: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
    /// ≤15 keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub owner: Option<String>,
    #[serde(default)]
    pub reusable: bool,
}

impl Documentation {
    /// Truncates `summary` to at most 35 whitespace-delimited words, as required at ingest.
    pub fn clamp_summary(&mut self) {
        let words: Vec<&str> = self.summary.split_whitespace().collect();
        if words.len() > 35 {
            self.summary = words[..35].join(" ");
        }
    }

    /// Truncates `keywords` to at most 15 entries, as required at ingest.
    pub fn clamp_keywords(&mut self) {
        self.keywords.truncate(15);
    }

    /// Serializes this block into the canonical text fed to `doc_vec`'s encoder call.
    pub fn to_embedding_text(&self) -> String {
        let params = {
            let mut pairs: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            pairs.sort();
            pairs.join(", ")
        };
        format!(
            "{} {} {} {} {}",
            self.summary,
            self.description,
            self.intent,
            self.keywords.join(" "),
            params
        )
    }
}
