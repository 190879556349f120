//! Prompt Builder (C6): renders `{system, user}` chat messages from
//! templates, embedding source, missed coverage, chosen paths, prior
//! failures, and optional user context.

pub mod branch_guidance;
pub mod templates;

use crate::errors::RunError;
use crate::model::{FailedTest, JunitVersion, Method, Path};
use minijinja::{Environment, UndefinedBehavior};
use std::collections::HashSet;

pub const YAML_SCHEMA_INSTRUCTIONS: &str = r#"Respond with a YAML document and nothing else, of the exact shape:

new_tests:
  - test_name: string
    test_behavior: string
    test_code: |-
      // one compilable test method
    new_imports_code: |-
      // zero or more import lines, or empty
"#;

const SYSTEM_TEMPLATE: &str = "You are an expert Java test engineer. Given the class under test and the \
existing test file, generate new JUnit test methods that increase line and branch coverage. \
{{ yaml_schema }}";

const USER_TEMPLATE: &str = "## Source under test ({{ source_path }})\n{{ source_numbered }}\n\n\
## Existing test file ({{ test_path }})\n{{ test_numbered }}\n\n\
{{ coverage_summary }}\n\
{{ method_blocks }}\
{{ branch_guidance }}\
{{ includes_section }}\
{{ instructions_section }}\
{{ failed_tests_section }}";

#[derive(Debug, Clone)]
pub struct Messages {
    pub system: String,
    pub user: String,
}

pub struct PromptContext<'a> {
    pub source_path: String,
    pub test_path: String,
    pub source_text: &'a str,
    pub test_text: &'a str,
    /// The fully rendered "Additional Includes" section (already
    /// wrapped by [`templates::additional_includes_section`], empty
    /// string when there's nothing to include) — not raw file text.
    pub included_files: String,
    pub additional_instructions: String,
}

/// A strict Jinja-like renderer: referencing an undefined variable is
/// a hard error, never a silent blank substitution.
pub fn render_strict(template: &str, vars: &minijinja::Value) -> Result<String, RunError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_template("t", template)?;
    let tmpl = env.get_template("t")?;
    Ok(tmpl.render(vars)?)
}

pub fn numbered(text: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| format!("{} {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One per-method prompt block. For complexity-1 methods the block
/// cites missed lines instead of a condition trace, since those
/// methods skip path selection entirely (C4).
pub enum MethodGuidance {
    Path { method_name: String, condition_trace: String },
    MissedLines { method_name: String, missed_lines: Vec<u32> },
}

pub fn render_method_block(guidance: &MethodGuidance) -> String {
    match guidance {
        MethodGuidance::Path { method_name, condition_trace } => format!(
            "\n=========\nPlease generate test case for method `{method_name}` to cover the path: {condition_trace}"
        ),
        MethodGuidance::MissedLines { method_name, missed_lines } => {
            if missed_lines.is_empty() {
                String::new()
            } else {
                let lines = missed_lines.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", ");
                format!("\n=========\nPlease generate test case for method `{method_name}` to cover missed lines: {lines}")
            }
        }
    }
}

pub struct PromptBuilder;

impl PromptBuilder {
    fn assemble(
        ctx: &PromptContext,
        coverage_summary: &str,
        method_blocks: &str,
        branch_guidance: &str,
        failed_tests_section: &str,
    ) -> Result<Messages, RunError> {
        let vars = minijinja::context! { yaml_schema => YAML_SCHEMA_INSTRUCTIONS };
        let system = render_strict(SYSTEM_TEMPLATE, &vars)?;

        let includes_section = ctx.included_files.clone();
        let instructions_section = templates::additional_instructions_section(&ctx.additional_instructions);

        let vars = minijinja::context! {
            source_path => ctx.source_path.clone(),
            test_path => ctx.test_path.clone(),
            source_numbered => numbered(ctx.source_text),
            test_numbered => numbered(ctx.test_text),
            coverage_summary => coverage_summary.to_string(),
            method_blocks => method_blocks.to_string(),
            branch_guidance => branch_guidance.to_string(),
            includes_section => includes_section,
            instructions_section => instructions_section,
            failed_tests_section => failed_tests_section.to_string(),
        };
        let user = render_strict(USER_TEMPLATE, &vars)?;
        Ok(Messages { system, user })
    }

    /// Baseline prompt: no path selection, used when current coverage
    /// is exactly 0/0.
    pub fn build_baseline(ctx: &PromptContext, methods: &[Method]) -> Result<Messages, RunError> {
        let method_blocks: String = methods
            .iter()
            .map(|m| render_method_block(&MethodGuidance::MissedLines {
                method_name: m.name.clone(),
                missed_lines: Vec::new(),
            }))
            .collect();
        Self::assemble(ctx, "No coverage data yet; generate an initial set of tests.", &method_blocks, "", "")
    }

    /// Coverage-guided prompt: embeds a missed-lines summary per
    /// method but does not use path selection.
    pub fn build_coverage(ctx: &PromptContext, guidance: &[MethodGuidance], branch_hints: &[String]) -> Result<Messages, RunError> {
        let coverage_summary = "Generate tests to cover the missed lines and branches listed below.";
        let method_blocks: String = guidance.iter().map(render_method_block).collect();
        let branch_block = branch_guidance::render_guidance_block(branch_hints);
        Self::assemble(ctx, coverage_summary, &method_blocks, &branch_block, "")
    }

    /// Control (path-guided) prompt: one or two blocks per method
    /// depending on two-path vs single-path mode; complexity-1
    /// methods are represented with missed-line blocks instead.
    pub fn build_control(ctx: &PromptContext, guidance: &[MethodGuidance], branch_hints: &[String]) -> Result<Messages, RunError> {
        let coverage_summary = "Generate tests exercising the specific execution paths listed below.";
        let method_blocks: String = guidance.iter().map(render_method_block).collect();
        let branch_block = branch_guidance::render_guidance_block(branch_hints);
        Self::assemble(ctx, coverage_summary, &method_blocks, &branch_block, "")
    }

    /// Repair prompt: embeds each failing test's code and error
    /// excerpt, asks for the same YAML shape.
    pub fn build_repair(ctx: &PromptContext, failed: &[FailedTest]) -> Result<Messages, RunError> {
        let failed_text: String = failed
            .iter()
            .map(|f| format!("Test:\n{}\nError:\n{}\n", f.code.test_code, f.error_message))
            .collect::<Vec<_>>()
            .join("\n---\n");
        let section = templates::failed_tests_section(&failed_text);
        Self::assemble(ctx, "Fix the failing tests below and resubmit.", "", "", &section)
    }

    /// Single-shot symprompt entry: one block per enumerated path,
    /// for every method, no coverage feedback.
    pub fn build_symprompt(ctx: &PromptContext, method_name: &str, paths: &[Path]) -> Result<Messages, RunError> {
        let method_blocks: String = paths
            .iter()
            .map(|p| render_method_block(&MethodGuidance::Path {
                method_name: method_name.to_string(),
                condition_trace: p.condition_trace.clone(),
            }))
            .collect();
        Self::assemble(ctx, "Generate tests exercising every enumerated path.", &method_blocks, "", "")
    }
}

pub fn skeleton_for(version: JunitVersion, test_class_name: &str, source_imports: &str) -> String {
    format!("{source_imports}\n{}", templates::skeleton_class(version, test_class_name))
}

pub fn missed_lines_for_method(method: &Method, line_map: &crate::model::LineMap, missed_lines: &HashSet<u32>) -> Vec<u32> {
    let mut lines: Vec<u32> = method
        .nodes
        .iter()
        .flat_map(|n| line_map.lines_for(n.node_id).iter().copied())
        .filter(|l| missed_lines.contains(l))
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_render_fails_on_missing_variable() {
        let vars = minijinja::context! { a => "1" };
        let err = render_strict("{{ a }} {{ b }}", &vars).unwrap_err();
        assert!(matches!(err, RunError::Template(_)));
    }

    #[test]
    fn strict_render_succeeds_with_all_variables() {
        let vars = minijinja::context! { a => "1", b => "2" };
        let out = render_strict("{{ a }}-{{ b }}", &vars).unwrap();
        assert_eq!(out, "1-2");
    }

    #[test]
    fn numbered_prefixes_each_line() {
        let out = numbered("a\nb");
        assert_eq!(out, "1 a\n2 b");
    }

    #[test]
    fn missed_lines_block_is_empty_when_nothing_missed() {
        let block = render_method_block(&MethodGuidance::MissedLines {
            method_name: "f".into(),
            missed_lines: Vec::new(),
        });
        assert_eq!(block, "");
    }

    #[test]
    fn baseline_prompt_contains_yaml_schema_hint() {
        let ctx = PromptContext {
            source_path: "Foo.java".into(),
            test_path: "FooTest.java".into(),
            source_text: "class Foo {}",
            test_text: "",
            included_files: String::new(),
            additional_instructions: String::new(),
        };
        let messages = PromptBuilder::build_baseline(&ctx, &[]).unwrap();
        assert!(messages.system.contains("new_tests"));
    }
}
