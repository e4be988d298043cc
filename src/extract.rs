use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::errors::AnalysisError;

lazy_static! {
    // Opening fences with an optional language tag, and bare closing fences.
    static ref RE_CODE_FENCE: Regex = Regex::new(r"```(?:json)?\n?").unwrap();
}

/// Recovers a JSON value from the model's free-text reply.
///
/// Strips markdown code fences wherever they appear, then takes everything
/// between the first `{` and the last `}` as the candidate document. This
/// tolerates the leading and trailing prose models emit despite being told
/// not to.
///
/// Parse failures are retryable: truncated JSON is almost always a
/// max_tokens or generation hiccup, not a permanent condition. The parser
/// diagnostic and a snippet of the offending text are logged, never shown
/// to the end user.
pub fn extract_json(raw: &str) -> Result<Value, AnalysisError> {
    let cleaned = RE_CODE_FENCE.replace_all(raw.trim(), "");
    let cleaned = cleaned.trim();

    let candidate = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &cleaned[start..=end],
        _ => cleaned,
    };

    serde_json::from_str(candidate).map_err(|err| {
        let snippet: String = candidate.chars().take(500).collect();
        tracing::error!("JSON parse failed: {err}");
        tracing::error!("first 500 chars of candidate: {snippet}");
        AnalysisError::InvalidJson {
            message: err.to_string(),
            snippet,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_json() {
        let value = extract_json(r#"{"overall_score": 7}"#).unwrap();
        assert_eq!(value, json!({"overall_score": 7}));
    }

    #[test]
    fn strips_fences_and_surrounding_prose() {
        let raw = "Here you go:\n```json\n{\"overall_score\":7}\n```\nHope that helps!";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"overall_score": 7}));
    }

    #[test]
    fn tolerates_prose_without_fences() {
        let raw = "Sure! The analysis is {\"language\": \"Rust\"} as requested.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"language": "Rust"}));
    }

    #[test]
    fn keeps_nested_braces_intact() {
        let raw = "{\"scores\": {\"security\": 9}} trailing";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"scores": {"security": 9}}));
    }

    #[test]
    fn unbalanced_braces_fail_retryably() {
        let err = extract_json("{\"overall_score\": ").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidJson { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn error_carries_a_bounded_snippet() {
        let raw = format!("{{\"key\": \"{}", "a".repeat(2000));
        if let AnalysisError::InvalidJson { snippet, .. } = extract_json(&raw).unwrap_err() {
            assert_eq!(snippet.chars().count(), 500);
        } else {
            panic!("expected InvalidJson");
        }
    }

    #[test]
    fn plain_prose_fails_retryably() {
        let err = extract_json("I could not analyze this code.").unwrap_err();
        assert!(err.is_retryable());
    }
}
