//! String utility functions

use serde_json::Value as JsonValue;

use super::json::value_to_string;

/// Parse a string that may be a JSON array or comma-separated values into a Vec<String>.
///
/// Handles:
/// - JSON arrays: `["a", "b", "c"]` (non-string elements are stringified)
/// - Comma-separated: `a, b, c`
/// - A single value: `a`
/// - Malformed JSON arrays: falls back to comma splitting
pub fn parse_string_array(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<JsonValue>>(trimmed) {
            Ok(items) => items.iter().filter_map(value_to_string).collect(),
            Err(_) => split_csv(trimmed.trim_matches(|c| c == '[' || c == ']')),
        }
    } else {
        split_csv(trimmed)
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize a tag-like attribute value to a list of strings.
///
/// Native arrays are taken element-wise; strings go through
/// [`parse_string_array`]; other scalars become a single element.
pub fn string_list_from_value(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map(value_to_string).collect(),
        JsonValue::String(s) => parse_string_array(s),
        JsonValue::Null | JsonValue::Object(_) => Vec::new(),
        other => value_to_string(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_string_array_json() {
        assert_eq!(parse_string_array(r#"["2"]"#), vec!["2"]);
        assert_eq!(parse_string_array(r#"["a", "b"]"#), vec!["a", "b"]);
        assert_eq!(parse_string_array("[1, 2]"), vec!["1", "2"]);
    }

    #[test]
    fn test_parse_string_array_csv() {
        assert_eq!(parse_string_array("2,3,4"), vec!["2", "3", "4"]);
        assert_eq!(parse_string_array(" a , b ,, c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_string_array_single() {
        assert_eq!(parse_string_array("production"), vec!["production"]);
        assert!(parse_string_array("   ").is_empty());
    }

    #[test]
    fn test_parse_string_array_malformed_json() {
        assert_eq!(parse_string_array(r#"["a", "b""#), vec!["a", "b"]);
    }

    #[test]
    fn test_string_list_from_native_array() {
        assert_eq!(
            string_list_from_value(&json!(["2", "3", "4"])),
            vec!["2", "3", "4"]
        );
        assert_eq!(string_list_from_value(&json!([1, true])), vec!["1", "true"]);
    }

    #[test]
    fn test_string_list_from_scalar() {
        assert_eq!(string_list_from_value(&json!(5)), vec!["5"]);
        assert!(string_list_from_value(&json!(null)).is_empty());
    }
}
