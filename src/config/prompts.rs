//! LLM prompt templates, pulled out of code so they can be tuned without a rebuild.
//!
//! Each template is an explicit named field with its own format-parameter list (documented
//! per field) rather than one shared "system prompt" string, per [`Config`](super::Config)'s
//! design note on global prompt templates.

use super::error::ConfigError;

/// Every LLM prompt template the pipeline uses, loaded once at startup and validated.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Params: `{query}`. Must correct spelling/grammar only, preserving wording and intent.
    pub normalize: String,
    /// Params: `{query}`, `{count}`. Must return exactly `{count}` comma-separated paraphrases.
    pub expand: String,
    /// Params: `{candidates}`. Candidate lines are pre-formatted by the caller.
    pub rerank: String,
    /// Params: `{items}`, `{top_k}`. Item blocks are pre-formatted MADL text by the caller.
    pub final_rank: String,
    /// Params: `{source}`. Must return MADL JSON.
    pub madl: String,
    /// Params: `{description}`, `{steps}`. Must return a strict 12-word intent summary.
    pub dedupe_summary: String,
    /// Params: `{new_record}`, `{matches}`. Method-flavor dedupe verdict prompt.
    pub dedupe_verification_method: String,
    /// Params: `{new_record}`, `{matches}`. TestCase-flavor dedupe verdict prompt.
    pub dedupe_verification_testcase: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            normalize: "Correct only the spelling and grammar of the following search query. \
                Preserve its wording and intent exactly; do not rephrase, expand, or answer it. \
                Return a single corrected sentence and nothing else.\n\nQuery: {query}"
                .to_string(),
            expand: "Generate exactly {count} alternative phrasings (paraphrases) of the \
                following search query that preserve its original intent. Return them as a \
                single comma-separated list and nothing else.\n\nQuery: {query}"
                .to_string(),
            rerank: "Reorder the following candidates by relevance to the user's query, most \
                relevant first. Reply with one candidate id per line, in the new order, and \
                nothing else.\n\n{candidates}"
                .to_string(),
            final_rank: "Given the items below, select exactly {top_k} of them and assign each \
                a confidence score from 0 to 100 reflecting how well it satisfies the user's \
                intent. Reply with exactly {top_k} lines formatted as `<id> | <score>`, highest \
                score first, and nothing else.\n\n{items}"
                .to_string(),
            madl: "Read the following automation source and produce a MADL JSON object with \
                fields: method_name, summary (<=35 words), description, intent, params (object), \
                applies, returns, keywords (<=15 items), owner, example_usage, created, \
                last_updated. Reply with JSON only.\n\nSource:\n{source}"
                .to_string(),
            dedupe_summary: "Summarize the intent of the following record in exactly 12 words \
                or fewer. Reply with the summary only, nothing else.\n\nDescription: \
                {description}\nSteps: {steps}"
                .to_string(),
            dedupe_verification_method: "Compare the new automation method below against the \
                existing candidates. Consider two methods DUPLICATE only if they automate the \
                same action against the same target; methods that use different locators or \
                selectors for the same action are still UNIQUE. Reply with a single word: \
                DUPLICATE or UNIQUE.\n\nNew method:\n{new_record}\n\nExisting \
                candidates:\n{matches}"
                .to_string(),
            dedupe_verification_testcase: "Compare the new test case below against the existing \
                candidates. Consider two test cases DUPLICATE only if they verify the same \
                behavior under the same preconditions. Reply with a single word: DUPLICATE or \
                UNIQUE.\n\nNew test case:\n{new_record}\n\nExisting candidates:\n{matches}"
                .to_string(),
        }
    }
}

impl PromptTemplates {
    /// Every template must be non-empty and mention each of its declared placeholders.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check("normalize", &self.normalize, &["{query}"])?;
        Self::check("expand", &self.expand, &["{query}", "{count}"])?;
        Self::check("rerank", &self.rerank, &["{candidates}"])?;
        Self::check("final_rank", &self.final_rank, &["{items}", "{top_k}"])?;
        Self::check("madl", &self.madl, &["{source}"])?;
        Self::check(
            "dedupe_summary",
            &self.dedupe_summary,
            &["{description}", "{steps}"],
        )?;
        Self::check(
            "dedupe_verification_method",
            &self.dedupe_verification_method,
            &["{new_record}", "{matches}"],
        )?;
        Self::check(
            "dedupe_verification_testcase",
            &self.dedupe_verification_testcase,
            &["{new_record}", "{matches}"],
        )?;
        Ok(())
    }

    fn check(name: &'static str, template: &str, placeholders: &[&str]) -> Result<(), ConfigError> {
        if template.trim().is_empty() {
            return Err(ConfigError::EmptyPromptTemplate { name });
        }
        for placeholder in placeholders {
            if !template.contains(placeholder) {
                return Err(ConfigError::MissingPromptPlaceholder {
                    name,
                    placeholder,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_templates_validate() {
        PromptTemplates::default().validate().unwrap();
    }

    #[test]
    fn missing_placeholder_is_rejected() {
        let mut templates = PromptTemplates::default();
        templates.normalize = "no placeholder here".to_string();
        let err = templates.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingPromptPlaceholder { name: "normalize", .. }
        ));
    }

    #[test]
    fn empty_template_is_rejected() {
        let mut templates = PromptTemplates::default();
        templates.rerank = "   ".to_string();
        let err = templates.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyPromptTemplate { name: "rerank" }
        ));
    }
}
