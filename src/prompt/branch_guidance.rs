//! Branch-coverage guidance hints (part of the Prompt Builder, C6).
//!
//! Grounded on the upstream `CFGBranchAnalyzer`: for each missed
//! branch site, emit a natural-language hint describing the untaken
//! direction, so the LLM has something more concrete to aim for than
//! a bare line number.

use crate::model::{AstNode, Method};
use std::collections::HashSet;

pub fn guidance_for(method: &Method, missed_branches: &HashSet<u32>) -> Vec<String> {
    let mut hints = Vec::new();
    for node in &method.nodes {
        if !method_node_touches_missed(node, missed_branches) {
            continue;
        }
        match node.kind.as_str() {
            "if_statement" => {
                hints.push(format!(
                    "Test case where condition '{}' evaluates to True",
                    node.text
                ));
                hints.push(format!(
                    "Test case where condition '{}' evaluates to False",
                    node.text
                ));
            }
            "for_statement" | "while_statement" | "do_statement" | "enhanced_for_statement" => {
                hints.push("Test case that enters the loop".to_string());
                hints.push("Test case that skips the loop".to_string());
            }
            _ => {}
        }
    }
    hints
}

fn method_node_touches_missed(node: &AstNode, missed_branches: &HashSet<u32>) -> bool {
    missed_branches.contains(&node.line_index)
}

/// `=== Branch Coverage Guidance ===` text block, the same heading the
/// upstream tool's prompt uses.
pub fn render_guidance_block(hints: &[String]) -> String {
    if hints.is_empty() {
        return String::new();
    }
    let mut out = String::from("=== Branch Coverage Guidance ===\n");
    for hint in hints {
        out.push_str("- ");
        out.push_str(hint);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{build_methods, frontend::parse_java};

    #[test]
    fn if_statement_gets_true_false_hints() {
        let src = r#"
public class Foo {
    public int f(int x) {
        if (x > 0) {
            return 1;
        }
        return 0;
    }
}
"#;
        let unit = parse_java(src).unwrap();
        let outcome = build_methods(&unit);
        let method = &outcome.methods[0];
        let if_line = method
            .nodes
            .iter()
            .find(|n| n.kind == "if_statement")
            .unwrap()
            .line_index;
        let missed = HashSet::from([if_line]);
        let hints = guidance_for(method, &missed);
        assert_eq!(hints.len(), 2);
        assert!(hints[0].contains("True"));
        assert!(hints[1].contains("False"));
    }

    #[test]
    fn empty_hints_render_to_empty_block() {
        assert_eq!(render_guidance_block(&[]), "");
    }
}
