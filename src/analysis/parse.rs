use serde::Deserialize;
use tracing::{info, warn};

use super::outcome::{AnalysisFailure, AnalysisOutcome, AnalysisReport, FailureKind, NOT_AVAILABLE};

/// Colors recognised when the response is not valid JSON, in match priority order
pub const COLOR_VOCABULARY: [&str; 10] = [
    "red", "blue", "green", "yellow", "orange", "purple", "brown", "black", "white", "gray",
];

const UNKNOWN_COLOR: &str = "unknown";
const MISSING_SUMMARY: &str = "Could not parse summary from response.";

#[derive(Debug, Deserialize)]
struct Verdict {
    color: Option<String>,
    date: Option<String>,
    summary: Option<String>,
}

/// Remove a Markdown code fence (```` ```json ```` or bare ```` ``` ````) around the text
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// First vocabulary color that appears as a word in `text`
pub fn scan_color(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();

    COLOR_VOCABULARY
        .iter()
        .copied()
        .find(|color| words.contains(color))
}

/// Turn the model's raw answer into an outcome.
///
/// Valid JSON gives `Succeeded` (color lowercased, blanks replaced by
/// placeholders). An object without a `color` field is an `error_parsing`
/// failure. Anything else is too, carrying the raw text and a color salvaged
/// by [`scan_color`] when possible.
pub fn parse_response(raw: &str) -> AnalysisOutcome {
    match decode_verdict(strip_code_fence(raw)) {
        Ok(Verdict { color: None, .. }) => {
            warn!("Model response has no color field: {}", raw);
            AnalysisOutcome::Failed(AnalysisFailure::new(
                FailureKind::Parsing,
                format!("Response JSON has no color field, raw response: {}", raw),
            ))
        }
        Ok(verdict) => {
            let color = non_blank(verdict.color)
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| UNKNOWN_COLOR.to_string());
            let date = non_blank(verdict.date).unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let summary = non_blank(verdict.summary).unwrap_or_else(|| MISSING_SUMMARY.to_string());

            info!("Analysis complete. Color: {}, Date: {}", color, date);
            AnalysisOutcome::Succeeded(AnalysisReport { color, date, summary })
        }
        Err(e) => {
            warn!("Error parsing model response: {}", e);
            warn!("Raw response text: {}", raw);

            let salvaged = scan_color(raw).unwrap_or(UNKNOWN_COLOR);
            if salvaged != UNKNOWN_COLOR {
                info!("Found color '{}' via text search as fallback", salvaged);
            }

            AnalysisOutcome::Failed(AnalysisFailure {
                kind: FailureKind::Parsing,
                message: format!("Error parsing JSON ({}), raw response: {}", e, raw),
                salvaged_color: Some(salvaged.to_string()),
            })
        }
    }
}

fn decode_verdict(text: &str) -> Result<Verdict, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("expected a JSON object, got {}", value));
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_is_parsed_and_lowercased() {
        let raw = "```json\n{\"color\":\"Blue\",\"date\":\"N/A\",\"summary\":\"x\"}\n```";
        let outcome = parse_response(raw);
        assert!(outcome.is_success());
        assert_eq!(
            outcome.into_triple(),
            ("blue".to_string(), "N/A".to_string(), "x".to_string())
        );
    }

    #[test]
    fn test_bare_fence_and_plain_json() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_date_is_taken_from_structured_result() {
        let raw = r#"{"color": "purple", "date": "Wednesday, April 23rd", "summary": "Purple is testing."}"#;
        let outcome = parse_response(raw);
        assert_eq!(outcome.date(), "Wednesday, April 23rd");
        assert_eq!(outcome.color(), "purple");
    }

    #[test]
    fn test_missing_fields_get_placeholders() {
        let outcome = parse_response(r#"{"color": " ", "summary": "Nothing announced."}"#);
        assert!(outcome.is_success());
        assert_eq!(outcome.color(), "unknown");
        assert_eq!(outcome.date(), "N/A");
        assert_eq!(outcome.summary(), "Nothing announced.");
    }

    #[test]
    fn test_missing_color_field_is_a_parse_failure() {
        let raw = r#"{"date": "Monday, April 6th", "summary": "Blue is testing."}"#;
        let outcome = parse_response(raw);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Parsing));
        let (color, date, message) = outcome.into_triple();
        assert_eq!(color, "error_parsing");
        assert_eq!(date, "N/A");
        assert!(message.contains(raw));
    }

    #[test]
    fn test_plain_text_falls_back_to_color_scan() {
        let raw = "I think the color is green today";
        let outcome = parse_response(raw);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Parsing));
        let (color, date, message) = outcome.into_triple();
        assert_eq!(color, "green");
        assert_eq!(date, "N/A");
        assert!(message.contains(raw));
    }

    #[test]
    fn test_fallback_without_color_reports_unknown() {
        let outcome = parse_response("Sorry, the recording was silent.");
        assert_eq!(outcome.color(), "unknown");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Parsing));
    }

    #[test]
    fn test_non_object_json_is_a_parse_failure() {
        let outcome = parse_response("[\"blue\"]");
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Parsing));
        assert_eq!(outcome.color(), "blue");
    }

    #[test]
    fn test_scan_color_uses_vocabulary_order_and_whole_words() {
        assert_eq!(scan_color("GREEN, then Red"), Some("red"));
        assert_eq!(scan_color("the message was recorded"), None);
        assert_eq!(scan_color("Gray."), Some("gray"));
    }
}
