//! Model response validation
//!
//! The model replies with free text that should contain a JSON array of
//! edits and explanations. Extraction slices from the first `[` to the last
//! `]`, so prose before or after the array is tolerated. Anything inside
//! the array that is not one of the two known shapes rejects the whole
//! response.
//!
//! The validator never retries. An invalid response costs the caller one
//! attempt; the caller may append [`crate::llm::prompts::CORRECTION_PROMPT`]
//! to the conversation and try again on a later turn.

use crate::patch::{EditOperation, PatchItem, PatchSet};
use serde_json::Value;

/// Outcome of validating one raw model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(PatchSet),
    /// Recoverable: the caller consumes one retry with no file mutation.
    Invalid { reason: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }
}

fn invalid(reason: impl Into<String>) -> Validation {
    Validation::Invalid {
        reason: reason.into(),
    }
}

/// Extract and parse the JSON array embedded in `raw`. The resulting patch
/// set is stamped with `snapshot_id`, binding its line numbers to the
/// snapshot the model was shown.
pub fn validate(raw: &str, snapshot_id: u64) -> Validation {
    let clean = strip_markdown_fences(raw);

    let Some(start) = clean.find('[') else {
        return invalid("no JSON array found in model response");
    };
    let Some(end) = clean.rfind(']') else {
        return invalid("JSON array is never closed in model response");
    };
    if end < start {
        return invalid("no JSON array found in model response");
    }

    let elements: Vec<Value> = match serde_json::from_str(&clean[start..=end]) {
        Ok(Value::Array(elements)) => elements,
        Ok(_) => return invalid("model response is valid JSON but not an array"),
        Err(e) => return invalid(format!("JSON parse error in model response: {e}")),
    };

    let mut items = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        match parse_item(element) {
            Ok(item) => items.push(item),
            Err(reason) => return invalid(format!("array element {index}: {reason}")),
        }
    }

    Validation::Valid(PatchSet { snapshot_id, items })
}

/// Map one array element onto the two known shapes, rejecting everything
/// else.
fn parse_item(element: &Value) -> Result<PatchItem, String> {
    let Some(object) = element.as_object() else {
        return Err("not a JSON object".to_string());
    };

    if object.contains_key("operation") {
        let operation = object
            .get("operation")
            .and_then(Value::as_str)
            .ok_or("\"operation\" is not a string")?;
        let line = object
            .get("line")
            .and_then(Value::as_u64)
            .filter(|&line| line > 0)
            .ok_or("\"line\" is not a positive integer")? as usize;

        return match operation {
            "Replace" => Ok(PatchItem::Edit(EditOperation::Replace {
                line,
                content: required_content(object)?,
            })),
            "Delete" => Ok(PatchItem::Edit(EditOperation::Delete { line })),
            "InsertAfter" => Ok(PatchItem::Edit(EditOperation::InsertAfter {
                line,
                content: required_content(object)?,
            })),
            other => Err(format!("unknown operation {other:?}")),
        };
    }

    if let Some(explanation) = object.get("explanation") {
        let text = explanation
            .as_str()
            .ok_or("\"explanation\" is not a string")?;
        return Ok(PatchItem::Explanation(text.to_string()));
    }

    Err("object is neither an edit nor an explanation".to_string())
}

fn required_content(object: &serde_json::Map<String, Value>) -> Result<String, String> {
    object
        .get("content")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| "\"content\" is missing or not a string".to_string())
}

/// Strip markdown code fences from a response.
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_valid(raw: &str) -> PatchSet {
        match validate(raw, 0) {
            Validation::Valid(patch) => patch,
            Validation::Invalid { reason } => panic!("expected valid, got: {reason}"),
        }
    }

    fn expect_invalid(raw: &str) -> String {
        match validate(raw, 0) {
            Validation::Invalid { reason } => reason,
            Validation::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_leading_and_trailing_junk_tolerated() {
        let raw = r#"...junk before [ {"operation":"Replace","line":2,"content":"x=1"} ] junk after"#;
        let patch = expect_valid(raw);
        assert_eq!(
            patch.items,
            vec![PatchItem::Edit(EditOperation::Replace {
                line: 2,
                content: "x=1".to_string(),
            })]
        );
    }

    #[test]
    fn test_markdown_fences_stripped() {
        let raw = "```json\n[{\"operation\":\"Delete\",\"line\":3}]\n```";
        let patch = expect_valid(raw);
        assert_eq!(patch.edits().len(), 1);
    }

    #[test]
    fn test_explanations_and_edits_mix() {
        let raw = r#"[
            {"explanation": "the operator was wrong"},
            {"operation": "Replace", "line": 7, "content": "        return a * b"},
            {"operation": "InsertAfter", "line": 9, "content": "    return None"}
        ]"#;
        let patch = expect_valid(raw);
        assert_eq!(patch.edits().len(), 2);
        assert_eq!(patch.explanations(), vec!["the operator was wrong"]);
    }

    #[test]
    fn test_patch_is_stamped_with_snapshot_id() {
        let raw = r#"[{"operation":"Delete","line":1}]"#;
        match validate(raw, 42) {
            Validation::Valid(patch) => assert_eq!(patch.snapshot_id, 42),
            Validation::Invalid { reason } => panic!("{reason}"),
        }
    }

    #[test]
    fn test_no_array_is_invalid() {
        let reason = expect_invalid("I could not find any problems with the script.");
        assert!(reason.contains("no JSON array"));
    }

    #[test]
    fn test_unparsable_array_is_invalid() {
        let reason = expect_invalid(r#"[{"operation": "Replace", "line": }]"#);
        assert!(reason.contains("JSON parse error"));
    }

    #[test]
    fn test_unknown_operation_rejects_whole_response() {
        let raw = r#"[
            {"operation": "Replace", "line": 1, "content": "fine"},
            {"operation": "Swap", "line": 2, "content": "nope"}
        ]"#;
        let reason = expect_invalid(raw);
        assert!(reason.contains("element 1"));
        assert!(reason.contains("Swap"));
    }

    #[test]
    fn test_unrecognized_shape_rejects_whole_response() {
        let raw = r#"[{"note": "models invent keys sometimes"}]"#;
        let reason = expect_invalid(raw);
        assert!(reason.contains("neither an edit nor an explanation"));
    }

    #[test]
    fn test_replace_without_content_is_invalid() {
        let reason = expect_invalid(r#"[{"operation":"Replace","line":2}]"#);
        assert!(reason.contains("content"));
    }

    #[test]
    fn test_delete_needs_no_content() {
        let patch = expect_valid(r#"[{"operation":"Delete","line":2}]"#);
        assert_eq!(
            patch.items,
            vec![PatchItem::Edit(EditOperation::Delete { line: 2 })]
        );
    }

    #[test]
    fn test_line_zero_is_invalid() {
        let reason = expect_invalid(r#"[{"operation":"Delete","line":0}]"#);
        assert!(reason.contains("positive integer"));
    }

    #[test]
    fn test_negative_line_is_invalid() {
        let reason = expect_invalid(r#"[{"operation":"Delete","line":-2}]"#);
        assert!(reason.contains("positive integer"));
    }

    #[test]
    fn test_non_array_json_is_invalid() {
        // An embedded array inside an object still parses (first [ to last ])
        // only when the slice itself is an array; a bare object is not.
        let reason = expect_invalid(r#"{"edits": "none"}"#);
        assert!(reason.contains("no JSON array"));
    }

    #[test]
    fn test_empty_array_is_valid_and_empty() {
        let patch = expect_valid("[]");
        assert!(patch.items.is_empty());
        assert!(patch.edits().is_empty());
    }
}
