//! Repair Loop (C12): turns validation failures from an iteration
//! into a follow-up prompt, bounded by `repair_rounds`.
//!
//! The queue and prompt construction live here; the Iteration
//! Controller owns the actual round loop (build prompt, call gateway,
//! validate, re-enqueue) since that loop shares the exact
//! integrate-run-classify-measure sequence the generation phase uses.

use crate::errors::RunError;
use crate::model::FailedTest;
use crate::prompt::{templates, PromptContext};
use std::collections::VecDeque;

/// From the core's perspective these are opaque template choices: both
/// ask for the same YAML shape back, the MCTS variant just nudges the
/// model to consider more than one fix before committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStyle {
    Plain,
    Mcts,
}

#[derive(Debug, Default)]
pub struct RepairQueue {
    items: VecDeque<FailedTest>,
}

impl RepairQueue {
    pub fn push(&mut self, failed: FailedTest) {
        self.items.push_back(failed);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Drains the whole queue; the caller re-enqueues whatever still
    /// fails after this round.
    pub fn drain_round(&mut self) -> Vec<FailedTest> {
        self.items.drain(..).collect()
    }
}

const MCTS_SUFFIX: &str = "\n\nBefore committing to a fix, enumerate at least two plausible root causes for each failure, briefly weigh them, then pick the one fix most likely to pass and return only that.";

pub fn build_repair_messages(ctx: &PromptContext, failed: &[FailedTest], style: RepairStyle) -> Result<crate::prompt::Messages, RunError> {
    let mut messages = crate::prompt::PromptBuilder::build_repair(ctx, failed)?;
    if style == RepairStyle::Mcts {
        messages.system.push_str(MCTS_SUFFIX);
    }
    Ok(messages)
}

/// Line-cleaned output of `test_dependency_command`, folded into the
/// Prompt Builder's "additional includes" context. Strips bracketed
/// log prefixes (`[INFO] `, `[WARNING] `, ...) and trailing `:test`
/// scope suffixes that build tools append to dependency lines.
pub fn clean_dependency_output(raw: &str) -> String {
    let bracket_re = regex::Regex::new(r"^\s*\[[A-Za-z]+\]\s*").unwrap();
    let scope_re = regex::Regex::new(r":test$").unwrap();
    raw.lines()
        .map(|line| {
            let stripped = bracket_re.replace(line, "");
            scope_re.replace(&stripped, "").trim().to_string()
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn additional_includes_from_dependencies(raw: &str) -> String {
    let cleaned = clean_dependency_output(raw);
    if cleaned.is_empty() {
        String::new()
    } else {
        templates::additional_includes_section(&cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeneratedTest;

    fn failed(code: &str, error: &str) -> FailedTest {
        FailedTest {
            code: GeneratedTest { test_code: code.to_string(), ..Default::default() },
            error_message: error.to_string(),
        }
    }

    #[test]
    fn queue_drains_everything_pushed() {
        let mut q = RepairQueue::default();
        q.push(failed("a()", "boom"));
        q.push(failed("b()", "boom2"));
        assert_eq!(q.len(), 2);
        let drained = q.drain_round();
        assert_eq!(drained.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn mcts_style_appends_enumeration_instruction() {
        let ctx = PromptContext {
            source_path: "Foo.java".into(),
            test_path: "FooTest.java".into(),
            source_text: "class Foo {}",
            test_text: "",
            included_files: String::new(),
            additional_instructions: String::new(),
        };
        let failed = vec![failed("assertTrue(false);", "AssertionError")];
        let plain = build_repair_messages(&ctx, &failed, RepairStyle::Plain).unwrap();
        let mcts = build_repair_messages(&ctx, &failed, RepairStyle::Mcts).unwrap();
        assert!(!plain.system.contains("enumerate"));
        assert!(mcts.system.contains("enumerate"));
    }

    #[test]
    fn dependency_output_is_cleaned_of_log_noise() {
        let raw = "[INFO] com.foo:bar:jar:1.0:test\n[INFO] \ncom.baz:qux:jar:2.0:test\n";
        let cleaned = clean_dependency_output(raw);
        assert_eq!(cleaned, "com.foo:bar:jar:1.0\ncom.baz:qux:jar:2.0");
    }
}
