//! Tolerant YAML loader for LLM replies (part of C7).
//!
//! LLMs reliably produce almost-YAML: markdown fences around the
//! payload, unescaped code blocks that break flow scalars, stray
//! braces, trailing commentary after the structured part. Grounded on
//! the upstream `load_yaml`/`try_fix_yaml` fallback chain: try a
//! direct parse first, then walk a fixed sequence of increasingly
//! aggressive repairs, returning the first one that parses.

use crate::errors::RunError;
use crate::model::GeneratedTest;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmReply {
    #[serde(default)]
    pub new_tests: Vec<GeneratedTest>,
}

/// Keys whose values are free-form code and should be coerced to a
/// literal block scalar (`key: |-`) before parsing, since models
/// frequently emit multi-line code as a bare flow scalar.
const CODE_KEYS: &[&str] = &["test_code", "new_imports_code"];

pub fn load_reply(response_text: &str) -> Result<LlmReply, RunError> {
    let trimmed = response_text.trim();
    let unfenced = strip_fence(trimmed);

    if let Ok(reply) = serde_yaml::from_str::<LlmReply>(&unfenced) {
        return Ok(reply);
    }

    try_fix(trimmed).ok_or_else(|| RunError::Yaml("exhausted all YAML repair strategies".to_string()))
}

fn fence_pattern() -> Regex {
    Regex::new(r"(?is)```(?:yaml)?\s*\n?(.*?)\n?\s*```").unwrap()
}

fn strip_fence(text: &str) -> String {
    let re = fence_pattern();
    if let Some(caps) = re.captures(text) {
        return caps[1].trim().to_string();
    }
    // No well-formed fence: drop everything up to the opening fence
    // marker and everything from a trailing fence marker onward.
    let leading_re = Regex::new(r"(?is)^.*?```(?:yaml)?\s*\n?").unwrap();
    let trailing_re = Regex::new(r"(?is)\n?\s*```.*$").unwrap();
    let stripped = leading_re.replace(text, "");
    trailing_re.replace(&stripped, "").trim().to_string()
}

fn try_fix(response_text: &str) -> Option<LlmReply> {
    let lines: Vec<&str> = response_text.lines().collect();

    // Strategy 1: force code-bearing keys onto a literal block scalar.
    if let Some(reply) = try_multiline_key_fix(&lines) {
        return Some(reply);
    }

    // Strategy 2: extract a fenced snippet anywhere in the text.
    if let Some(reply) = try_fenced_snippet(response_text) {
        return Some(reply);
    }

    // Strategy 3: strip a wrapping pair of curly braces.
    let braceless = response_text.trim().strip_prefix('{').unwrap_or(response_text.trim());
    let braceless = braceless.strip_suffix('}').unwrap_or(braceless);
    if let Ok(reply) = serde_yaml::from_str::<LlmReply>(braceless) {
        return Some(reply);
    }

    // Strategy 4: iteratively drop trailing lines until it parses and
    // the parsed document actually carries our top-level key.
    for i in 1..lines.len() {
        let candidate = lines[..lines.len() - i].join("\n");
        if let Ok(reply) = serde_yaml::from_str::<LlmReply>(&candidate) {
            if !reply.new_tests.is_empty() {
                return Some(reply);
            }
        }
    }

    // Strategy 5: use the `new_tests:` key as a start marker and the
    // last `test_code:` occurrence to bound the end of the document.
    let start_idx = response_text
        .find("\nnew_tests:")
        .map(|i| i + 1)
        .or_else(|| response_text.find("new_tests:"))?;
    let last_code_idx = response_text.rfind("test_code:")?;
    let end_idx = response_text[last_code_idx..]
        .find("\n\n")
        .map(|off| last_code_idx + off)
        .unwrap_or(response_text.len());
    let window = response_text[start_idx..end_idx].trim();
    serde_yaml::from_str::<LlmReply>(window).ok()
}

fn try_multiline_key_fix(lines: &[&str]) -> Option<LlmReply> {
    let mut modified: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    for line in modified.iter_mut() {
        for key in CODE_KEYS {
            if line.contains(key) && !line.contains("|-") {
                *line = line.replacen(key, &format!("{key} |-\n        "), 1);
            }
        }
    }
    serde_yaml::from_str::<LlmReply>(&modified.join("\n")).ok()
}

fn try_fenced_snippet(text: &str) -> Option<LlmReply> {
    let re = Regex::new(r"(?is)```(?:yaml)?[\s\S]*?```").ok()?;
    let snippet = re.find(text)?.as_str();
    let inner = snippet
        .trim_start_matches("```yaml")
        .trim_start_matches("```")
        .trim_end_matches('`');
    serde_yaml::from_str::<LlmReply>(inner).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_fenced_yaml() {
        let text = "```yaml\nnew_tests:\n  - test_name: foo\n    test_behavior: checks foo\n    test_code: |-\n      assertTrue(true);\n    new_imports_code: \"\"\n```";
        let reply = load_reply(text).unwrap();
        assert_eq!(reply.new_tests.len(), 1);
        assert_eq!(reply.new_tests[0].test_name, "foo");
    }

    #[test]
    fn parses_unfenced_yaml_with_leading_commentary() {
        let text = "Sure, here are the tests:\n\nnew_tests:\n  - test_name: bar\n    test_behavior: b\n    test_code: |-\n      x();\n    new_imports_code: \"\"\n\nLet me know if you need anything else.";
        let reply = load_reply(text).unwrap();
        assert_eq!(reply.new_tests[0].test_name, "bar");
    }

    #[test]
    fn fixes_bare_code_value_via_multiline_key_injection() {
        let text = "new_tests:\n  - test_name: baz\n    test_behavior: b\n    test_code: assertTrue(x > 0);\n    new_imports_code: \"\"";
        let reply = load_reply(text).unwrap();
        assert_eq!(reply.new_tests[0].test_name, "baz");
    }

    #[test]
    fn garbage_input_is_a_yaml_error() {
        let err = load_reply("not yaml at all: [unterminated").unwrap_err();
        assert!(matches!(err, RunError::Yaml(_)));
    }
}
