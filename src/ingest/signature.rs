//! Regex-based fallback signature/parameter extraction for method bodies, used when the LLM
//! is unavailable or its enrichment response doesn't parse. Recognizes the handful of
//! function shapes the source automation frameworks actually emit.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

const UNKNOWN_SIGNATURE: &str = "unknownMethod()";

fn signature_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?:async\s+)?function\s+([A-Za-z0-9_$]+)\s*\(([^)]*)\)")
                .expect("static pattern is valid"),
            Regex::new(r"(?:const|let|var)\s+([A-Za-z0-9_$]+)\s*=\s*(?:async\s*)?\(([^)]*)\)\s*=>")
                .expect("static pattern is valid"),
        ]
    })
}

/// Extracts a `name(params)` signature from raw source. Returns `unknownMethod()` when no
/// pattern matches.
pub fn extract_signature(raw_body: &str) -> String {
    for pattern in signature_patterns() {
        if let Some(captures) = pattern.captures(raw_body) {
            let name = &captures[1];
            let params = captures[2].trim();
            return format!("{name}({params})");
        }
    }
    UNKNOWN_SIGNATURE.to_string()
}

/// Extracts a generic per-parameter documentation map from raw source, in declaration order.
pub fn extract_params(raw_body: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pattern in signature_patterns() {
        if let Some(captures) = pattern.captures(raw_body) {
            let raw_params = &captures[2];
            for p in raw_params.split(',') {
                let p = p.trim();
                if !p.is_empty() {
                    params.insert(p.to_string(), format!("Parameter `{p}` used by this method."));
                }
            }
            break;
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_declaration_signature() {
        let body = "async function clickSubmitButton(page, selector) {\n  await page.click(selector);\n}";
        assert_eq!(extract_signature(body), "clickSubmitButton(page, selector)");
    }

    #[test]
    fn extracts_arrow_function_signature() {
        let body = "const waitForToast = async (page) => { await page.waitForSelector('.toast'); }";
        assert_eq!(extract_signature(body), "waitForToast(page)");
    }

    #[test]
    fn falls_back_to_unknown_method_for_unmatched_shapes() {
        assert_eq!(extract_signature("return 1;"), UNKNOWN_SIGNATURE);
    }

    #[test]
    fn extracts_param_documentation_map() {
        let body = "function clickSubmitButton(page, selector) { }";
        let params = extract_params(body);
        assert_eq!(params.len(), 2);
        assert!(params.contains_key("page"));
        assert!(params.contains_key("selector"));
    }
}
