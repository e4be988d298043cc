use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One place owns which of the model's key spellings mean the same field.
/// First present spelling wins; the others are dropped.
const LIST_ALIASES: &[(&str, &[&str])] = &[
    ("whats_great", &["whats_great", "what_works_well", "strengths"]),
    (
        "needs_improvement",
        &["needs_improvement", "what_needs_improvement", "improvements"],
    ),
    (
        "security_concerns",
        &["security_concerns", "security_issues", "vulnerabilities"],
    ),
];

const DOC_ALIASES: &[(&str, &[&str])] = &[
    (
        "documentation",
        &["documentation", "docs", "generated_documentation"],
    ),
    (
        "architecture_diagram",
        &["architecture_diagram", "diagram", "mermaid"],
    ),
];

lazy_static! {
    static ref RE_MARKUP_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// The validated analysis, the only artifact that leaves the pipeline.
///
/// Guarantees: every score is an integer in 1..=10, every list field is an
/// actual sequence, and no string anywhere contains markup tags.
#[derive(Debug, Clone, Serialize, Default)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub whats_great: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs_improvement: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_concerns: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub architecture_diagram: Option<String>,
    /// Keys the schema does not know about, sanitized but otherwise kept.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Reshapes the parsed-but-untrusted payload into an [`AnalysisReport`].
///
/// Degrades gracefully instead of rejecting: non-numbers become the midpoint
/// score, out-of-range scores are clamped, single values are wrapped into
/// one-element lists, markup is stripped from every string. Never fails for
/// any well-formed JSON input.
pub fn normalize(parsed: Value) -> AnalysisReport {
    let mut root = match parsed {
        Value::Object(map) => map,
        other => {
            tracing::warn!(
                "model returned a non-object payload ({}), producing an empty report",
                type_name(&other)
            );
            Map::new()
        }
    };

    merge_nested_analysis(&mut root);
    let mut root = sanitize_map(root);

    let overall_score = root.remove("overall_score").map(|v| clamp_score(&v));
    let language = root.remove("language").and_then(into_string);
    let scores = take_scores(&mut root);

    let mut report = AnalysisReport {
        overall_score,
        language,
        scores,
        ..Default::default()
    };

    for &(canonical, spellings) in LIST_ALIASES {
        let list = take_list(&mut root, spellings);
        match canonical {
            "whats_great" => report.whats_great = list.unwrap_or_default(),
            "needs_improvement" => report.needs_improvement = list.unwrap_or_default(),
            "security_concerns" => report.security_concerns = list.unwrap_or_default(),
            _ => {}
        }
    }

    for &(canonical, spellings) in DOC_ALIASES {
        let text = take_first(&mut root, spellings).and_then(into_string);
        match canonical {
            "documentation" => report.documentation = text,
            "architecture_diagram" => report.architecture_diagram = text,
            _ => {}
        }
    }

    report.extra = root;
    report
}

/// Merges a nested `analysis` sub-object into the top level wherever the top
/// level does not already define the key. Tolerates models that nest their
/// answer one level deeper than instructed.
fn merge_nested_analysis(root: &mut Map<String, Value>) {
    let nested = match root.get("analysis") {
        Some(Value::Object(inner)) => inner.clone(),
        _ => return,
    };
    root.remove("analysis");
    for (key, value) in nested {
        root.entry(key).or_insert(value);
    }
}

/// Recursively strips markup tags from every string in the value.
///
/// The model may echo injected markup back out of the analyzed source;
/// results are later rendered, so nothing tag-shaped survives.
fn sanitize(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(RE_MARKUP_TAG.replace_all(&s, "").into_owned()),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(sanitize_map(map)),
        other => other,
    }
}

fn sanitize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, sanitize(v))).collect()
}

/// Coerces a value to an integer score in 1..=10. Non-numbers default to the
/// midpoint rather than failing.
fn clamp_score(value: &Value) -> u8 {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => (n.round() as i64).clamp(1, 10) as u8,
        _ => 5,
    }
}

fn take_scores(root: &mut Map<String, Value>) -> BTreeMap<String, u8> {
    match root.remove("scores") {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| (key, clamp_score(&value)))
            .collect(),
        Some(other) => {
            // Not an object: keep it visible in extra rather than invent scores.
            tracing::warn!("expected an object for scores, got {}", type_name(&other));
            root.insert("scores".to_string(), other);
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    }
}

/// Takes the first present spelling of a list field and forces it into a
/// sequence: arrays pass through, null becomes empty, a lone value is
/// wrapped. Absent fields yield `None`.
fn take_list(root: &mut Map<String, Value>, spellings: &[&str]) -> Option<Vec<Value>> {
    let value = take_first(root, spellings)?;
    Some(match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => {
            tracing::warn!("expected an array, got {}; wrapping", type_name(&single));
            vec![single]
        }
    })
}

fn take_first(root: &mut Map<String, Value>, spellings: &[&str]) -> Option<Value> {
    let mut found = None;
    for key in spellings {
        match root.remove(*key) {
            Some(value) if found.is_none() => found = Some(value),
            _ => {}
        }
    }
    found
}

fn into_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_payload_passes_through() {
        let report = normalize(json!({
            "overall_score": 8,
            "language": "Rust",
            "scores": {"code_quality": 9, "security": 7},
            "whats_great": [{"description": "clear modules", "reason": "easy to navigate"}],
            "needs_improvement": [],
            "security_concerns": []
        }));

        assert_eq!(report.overall_score, Some(8));
        assert_eq!(report.language.as_deref(), Some("Rust"));
        assert_eq!(report.scores["code_quality"], 9);
        assert_eq!(report.whats_great.len(), 1);
        assert!(report.needs_improvement.is_empty());
    }

    #[test]
    fn coerces_and_clamps_malformed_fields() {
        let report = normalize(json!({
            "overall_score": "nine",
            "scores": {"security": 15, "performance": -3, "code_quality": "7"},
            "needs_improvement": {"issue": "x"}
        }));

        assert_eq!(report.overall_score, Some(5)); // non-numeric defaults
        assert_eq!(report.scores["security"], 10); // clamped down
        assert_eq!(report.scores["performance"], 1); // clamped up
        assert_eq!(report.scores["code_quality"], 7); // numeric string
        assert_eq!(report.needs_improvement, vec![json!({"issue": "x"})]);
    }

    #[test]
    fn fractional_scores_round_to_integers() {
        let report = normalize(json!({"overall_score": 7.6}));
        assert_eq!(report.overall_score, Some(8));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let report = normalize(json!({"language": "Go"}));
        assert_eq!(report.overall_score, None);
        assert!(report.scores.is_empty());
        assert!(report.whats_great.is_empty());
        assert!(report.documentation.is_none());
    }

    #[test]
    fn strips_markup_but_keeps_prose() {
        let report = normalize(json!({
            "language": "<script>alert(1)</script> looks fine",
            "whats_great": [{"description": "uses <b>bold</b> claims"}]
        }));

        assert_eq!(report.language.as_deref(), Some("alert(1) looks fine"));
        assert_eq!(
            report.whats_great[0]["description"],
            json!("uses bold claims")
        );
    }

    #[test]
    fn merges_nested_analysis_without_clobbering() {
        let report = normalize(json!({
            "overall_score": 9,
            "analysis": {
                "overall_score": 2,
                "language": "Python"
            }
        }));

        assert_eq!(report.overall_score, Some(9)); // top level wins
        assert_eq!(report.language.as_deref(), Some("Python")); // filled in
    }

    #[test]
    fn alias_spellings_land_on_canonical_fields() {
        let report = normalize(json!({
            "strengths": ["tests"],
            "what_needs_improvement": ["docs"],
            "security_issues": [{"problem": "injection"}]
        }));

        assert_eq!(report.whats_great, vec![json!("tests")]);
        assert_eq!(report.needs_improvement, vec![json!("docs")]);
        assert_eq!(report.security_concerns.len(), 1);
    }

    #[test]
    fn null_list_becomes_empty() {
        let report = normalize(json!({"security_concerns": null}));
        assert!(report.security_concerns.is_empty());
    }

    #[test]
    fn documentation_fields_are_plain_text() {
        let report = normalize(json!({
            "documentation": "# Overview<br>\nGood stuff",
            "diagram": "graph TD; A-->B"
        }));

        assert_eq!(report.documentation.as_deref(), Some("# Overview\nGood stuff"));
        assert_eq!(report.architecture_diagram.as_deref(), Some("graph TD; A-->B"));
    }

    #[test]
    fn non_object_payload_degrades_to_empty_report() {
        let report = normalize(json!([1, 2, 3]));
        assert_eq!(report.overall_score, None);
        assert!(report.extra.is_empty());
    }

    #[test]
    fn unknown_keys_survive_sanitized_in_extra() {
        let report = normalize(json!({"verdict": "<i>ship it</i>"}));
        assert_eq!(report.extra["verdict"], json!("ship it"));
    }
}
