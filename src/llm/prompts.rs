//! Repair prompts
//!
//! The system prompt fixes the output contract: a JSON array of edit
//! operations and explanations, with line numbers taken from the numbered
//! listing in the user prompt.

pub const REPAIR_SYSTEM: &str = r#"You are part of an automated repair loop for a failing script.
You will be given the script with 1-based line numbers prepended, followed by the output of its failing test run. Your job is to propose the smallest set of line edits that makes the tests pass.

OUTPUT FORMAT (JSON array):
[
  {"explanation": "one sentence on what was wrong and how this fixes it"},
  {"operation": "Replace", "line": 4, "content": "        return a - b"},
  {"operation": "Delete", "line": 10},
  {"operation": "InsertAfter", "line": 11, "content": "    return None"}
]

CRITICAL RULES:
- Respond with the JSON array and nothing else
- "operation" must be exactly "Replace", "Delete" or "InsertAfter"
- "line" is the 1-based number shown in the listing; all line numbers refer to the listing you were given, NOT to the file after earlier edits in your answer
- "content" is the full replacement or inserted line, without a line number prefix and without a trailing newline
- Preserve indentation exactly - spaces and tabs matter
- Do not rewrite code that is not implicated in the failure"#;

/// The user half of the conversation: numbered source, failure output, and
/// a reminder to stick to the contract.
pub fn build_repair_prompt(numbered_source: &str, test_output: &str) -> String {
    format!(
        "Here is the script that needs fixing:\n\n\
         {numbered_source}\n\n\
         Here is the test result:\n\n\
         {test_output}\n\
         Please provide your suggested changes, and remember to stick to the \
         exact format as described above."
    )
}

/// Appended to the conversation after an unparsable reply, so a later turn
/// can correct it.
pub const CORRECTION_PROMPT: &str =
    "Your response could not be parsed as JSON. Please restate your last message as pure JSON.";
