use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::prompt::STRUCTURED_ARRAY_KEY;
use crate::core::types::Record;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("code fence pattern is valid"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("extraction service returned an invalid format: {0}")]
    InvalidFormat(#[from] serde_json::Error),
}

/// Parses one extraction reply into records.
///
/// Accepted shapes, in order: the structured `{"resorts": [...]}` object, a
/// bare JSON array, and finally the compatibility path for free-text replies
/// that wrap the array in markdown code fences. `null` is an empty batch.
pub fn parse_records(raw: &str) -> Result<Vec<Record>, ParseError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return records_from_value(value);
    }

    // Compatibility path: the service ignored the contract and fenced its answer.
    let unfenced = strip_code_fences(trimmed);
    debug!("Reply was not plain JSON; retrying after stripping code fences");
    let value = serde_json::from_str::<serde_json::Value>(unfenced.trim())?;
    records_from_value(value)
}

/// Removes every literal "```json" and "```" marker.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

fn records_from_value(value: serde_json::Value) -> Result<Vec<Record>, ParseError> {
    let array = match value {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Object(mut obj) if obj.contains_key(STRUCTURED_ARRAY_KEY) => {
            obj.remove(STRUCTURED_ARRAY_KEY)
                .unwrap_or(serde_json::Value::Null)
        }
        other => other,
    };

    if array.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value::<Vec<Record>>(array)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"[
        {"Resort Name": "Sol Mar", "Country": "Spain", "Description": "Beachfront",
         "Star Rating": "4", "Price": "$180/night", "Main Picture": "https://img.example/sol.jpg"},
        {"Resort Name": "Lago Verde", "Country": "Italy", "Description": "N/A",
         "Star Rating": "5", "Price": "N/A", "Main Picture": "N/A"}
    ]"#;

    #[test]
    fn test_fenced_reply_matches_plain_reply() {
        let fenced = format!("```json\n{}\n```", PLAIN);
        let from_plain = parse_records(PLAIN).unwrap();
        let from_fenced = parse_records(&fenced).unwrap();

        assert_eq!(from_plain.len(), 2);
        assert_eq!(from_plain, from_fenced);
    }

    #[test]
    fn test_bare_fences_and_surrounding_whitespace() {
        let fenced = format!("\n  ```\n{}\n```  \n", PLAIN);
        assert_eq!(parse_records(&fenced).unwrap().len(), 2);
    }

    #[test]
    fn test_structured_object() {
        let structured = format!(r#"{{"resorts": {}}}"#, PLAIN);
        let records = parse_records(&structured).unwrap();
        assert_eq!(records[1].resort_name, "Lago Verde");
    }

    #[test]
    fn test_empty_and_null_are_empty_batches() {
        assert!(parse_records("[]").unwrap().is_empty());
        assert!(parse_records("```json\n[]\n```").unwrap().is_empty());
        assert!(parse_records("null").unwrap().is_empty());
        assert!(parse_records(r#"{"resorts": []}"#).unwrap().is_empty());
        assert!(parse_records(r#"{"resorts": null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_reply_is_invalid_format() {
        let err = parse_records("Here are the resorts you asked for: Sol Mar, Lago Verde").unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));

        let err = parse_records(r#"{"hotels": []}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));

        let err = parse_records(r#"[{"Country": "Spain"}]"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn test_strip_code_fences_everywhere() {
        assert_eq!(strip_code_fences("a```json b``` c```"), "a b c");
    }
}
