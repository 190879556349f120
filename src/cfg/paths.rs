//! Path Enumerator (C3): bounded breadth-first search from a method's
//! entry to its synthetic exit, tracking a global edge-visited set so
//! each kept path introduces at least one previously unvisited edge.
//!
//! Grounded on the upstream tool's `find_paths`/`identify_independent_paths`
//! pair: BFS with a `visited: {edge: bool}` map, stop when every edge
//! has been visited or a wall-clock timeout elapses, then a
//! discovery-order post-filter that keeps only genuinely independent
//! paths.

use crate::model::{CfgEdge, Method, NodeId, Path};
use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

struct PartialPath {
    nodes: Vec<NodeId>,
    edges: Vec<CfgEdge>,
}

/// Enumerate independent paths from `method.entry_id` to `method.exit_id`.
///
/// Returns whatever was found if `timeout` elapses before every edge
/// has been visited; this is a documented degrade, not an error.
pub fn enumerate_paths(method: &Method, timeout: Duration) -> Vec<Path> {
    let start = Instant::now();
    let all_edges: HashSet<(NodeId, NodeId, String)> = method
        .edges
        .iter()
        .map(|e| (e.src, e.dst, e.label.to_string()))
        .collect();
    let mut visited: HashSet<(NodeId, NodeId, String)> = HashSet::new();

    let mut candidates: Vec<PartialPath> = Vec::new();
    let mut queue: VecDeque<PartialPath> = VecDeque::new();
    queue.push_back(PartialPath {
        nodes: vec![method.entry_id],
        edges: Vec::new(),
    });

    while let Some(current) = queue.pop_front() {
        if start.elapsed() > timeout {
            break;
        }
        if visited.len() >= all_edges.len() && !all_edges.is_empty() {
            break;
        }
        let tail = *current.nodes.last().unwrap();
        if tail == method.exit_id {
            let introduces_new = current
                .edges
                .iter()
                .any(|e| !visited.contains(&(e.src, e.dst, e.label.to_string())));
            if introduces_new || candidates.is_empty() {
                for e in &current.edges {
                    visited.insert((e.src, e.dst, e.label.to_string()));
                }
                candidates.push(current);
            }
            continue;
        }
        let mut advanced = false;
        for succ in method.successors(tail) {
            if current.nodes.len() > method.nodes.len() + 2 {
                // guard against runaway cycles blowing the queue up;
                // a path visiting every node twice has gone in a
                // circle without making progress toward exit.
                continue;
            }
            let mut nodes = current.nodes.clone();
            nodes.push(succ.dst);
            let mut edges = current.edges.clone();
            edges.push(*succ);
            queue.push_back(PartialPath { nodes, edges });
            advanced = true;
        }
        if !advanced {
            // dead end with no edge to synthetic exit; drop silently,
            // the CFG builder should have stitched every non-exit
            // node with an outgoing edge.
        }
    }

    // Independent-paths post-filter: iterate candidates in discovery
    // order, keep a path iff it contributes >=1 not-yet-covered edge.
    let mut covered: HashSet<(NodeId, NodeId, String)> = HashSet::new();
    let mut kept = Vec::new();
    for candidate in candidates {
        let new_edges: Vec<_> = candidate
            .edges
            .iter()
            .filter(|e| !covered.contains(&(e.src, e.dst, e.label.to_string())))
            .cloned()
            .collect();
        if new_edges.is_empty() && !kept.is_empty() {
            continue;
        }
        for e in &candidate.edges {
            covered.insert((e.src, e.dst, e.label.to_string()));
        }
        kept.push(candidate);
    }

    kept.into_iter()
        .enumerate()
        .map(|(idx, candidate)| {
            let mut path = Path::new(&method.name, method.entry_id, idx, candidate.nodes, candidate.edges);
            path.condition_trace = condition_trace(method, &path.edges);
            path
        })
        .collect()
}

/// Human-readable trace of the conditions/returns along a path, in
/// the `"when <cond> is <true|false>\n... returns: <expr>"` shape the
/// upstream prompt builder embeds verbatim.
fn condition_trace(method: &Method, edges: &[CfgEdge]) -> String {
    let mut conditions = String::new();
    let mut returns = String::new();
    for edge in edges {
        if let Some(node) = method.nodes.iter().find(|n| n.node_id == edge.src) {
            match node.kind.as_str() {
                "if_statement" | "for_statement" | "while_statement" | "do_statement" | "enhanced_for_statement" => {
                    conditions.push_str(&format!("{} is {}\n", node.text, edge.label));
                }
                "return_statement" => {
                    let trimmed = node.text.replacen("return", "", 1);
                    returns.push_str(trimmed.trim());
                    returns.push('\n');
                }
                _ => {}
            }
        }
    }
    format!("when {conditions}returns: {returns}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{build_methods, frontend::parse_java};
    use std::time::Duration;

    #[test]
    fn guard_method_yields_two_independent_paths() {
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
        let paths = enumerate_paths(method, Duration::from_secs(5));
        assert!(paths.len() as i64 <= method.cyclomatic_complexity);
        assert!(!paths.is_empty());
        let covered: HashSet<_> = paths.iter().flat_map(|p| p.edges.iter().cloned()).collect();
        assert_eq!(covered.len(), method.edges.len());
    }

    #[test]
    fn path_labels_are_unique() {
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
        let paths = enumerate_paths(method, Duration::from_secs(5));
        let labels: HashSet<_> = paths.iter().map(|p| p.path_label.clone()).collect();
        assert_eq!(labels.len(), paths.len());
    }
}
