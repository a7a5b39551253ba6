//! MADL (Method/Automation Documentation Layer) JSON parsing with a graceful degrade chain:
//! strict JSON, then best-effort extraction of the outermost `{...}` block, then giving up
//! to the regex-based signature/keyword fallback entirely.

use serde_json::Value;

/// Tries strict JSON first, then extracts the outermost `{...}` substring and retries.
/// Returns `None` if neither parses.
pub fn parse_json_loosely(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// `true` iff `value` looks like a method MADL block: has `method_name` and
/// `method_documentation` keys.
pub fn looks_like_method_madl(value: &Value) -> bool {
    value.get("method_name").is_some() && value.get("method_documentation").is_some()
}

/// Parses the line-oriented `Summary: ...` / `Keywords: a, b, c` text format the test-case
/// enrichment prompt asks for.
pub fn parse_summary_keywords_text(text: &str) -> (String, Vec<String>) {
    let mut summary_lines: Vec<String> = Vec::new();
    let mut keywords: Vec<String> = Vec::new();
    let mut collecting_summary = false;

    for line in text.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        if lower.starts_with("summary:") {
            collecting_summary = true;
            let raw = trimmed["summary:".len()..].trim();
            if !raw.is_empty() {
                summary_lines.push(raw.to_string());
            }
            continue;
        }

        if lower.starts_with("keywords:") {
            collecting_summary = false;
            let raw_kw = &trimmed["keywords:".len()..];
            keywords = raw_kw
                .split(',')
                .map(|k| k.trim())
                .filter(|k| k.len() >= 2)
                .map(strip_leading_bullet)
                .collect();
            continue;
        }

        if collecting_summary && !trimmed.is_empty() {
            summary_lines.push(trimmed.to_string());
        }
    }

    let mut summary = summary_lines.join(" ");
    summary = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    let summary: String = summary.chars().take(900).collect();

    let mut seen = std::collections::HashSet::new();
    keywords.retain(|k| seen.insert(k.clone()));
    keywords.truncate(20);

    (summary, keywords)
}

fn strip_leading_bullet(s: &str) -> String {
    s.trim_start_matches(|c: char| c == '-' || c == '*' || c.is_ascii_digit() || c == '.' || c == ')' || c.is_whitespace())
        .to_string()
}
