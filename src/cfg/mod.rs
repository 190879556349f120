//! Method CFG Builder (C2): turns the flat, whole-file node/edge arena
//! produced by the front end into one method-local graph per testable
//! method, each terminated by a single synthetic exit node.

pub mod frontend;
pub mod paths;

use crate::model::{AnalysisSummary, CfgEdge, EdgeLabel, Method, NodeId};
use frontend::{MethodSkeleton, ParsedUnit};
use tracing::{trace, warn};

pub struct BuildOutcome {
    pub methods: Vec<Method>,
    pub summary: AnalysisSummary,
}

/// Build method-local CFGs for every testable method in `unit`.
///
/// A method is testable iff non-private, non-trivial, not a static
/// `main`, and its computed complexity is >= 1 (complexity-0 methods
/// are dropped from the production path and only counted in
/// `AnalysisSummary::complexity_zero_methods`, per the documented
/// open-question resolution).
pub fn build_methods(unit: &ParsedUnit) -> BuildOutcome {
    let mut methods = Vec::new();
    let mut summary = AnalysisSummary::default();
    let mut next_exit_id = unit
        .nodes
        .iter()
        .map(|n| n.node_id)
        .max()
        .map(|m| m + 1)
        .unwrap_or(0);

    for skeleton in &unit.methods {
        if skeleton.is_private || skeleton.is_trivial || skeleton.is_static_main {
            continue;
        }
        let exit_id = next_exit_id;
        next_exit_id += 1;
        if let Some(method) = build_one(unit, skeleton, exit_id) {
            if method.cyclomatic_complexity < 1 {
                summary.complexity_zero_methods += 1;
                trace!(method = %skeleton.name, "dropping complexity-0 method");
                continue;
            }
            methods.push(method);
        }
    }

    BuildOutcome { methods, summary }
}

fn build_one(unit: &ParsedUnit, skeleton: &MethodSkeleton, exit_id: NodeId) -> Option<Method> {
    let entry = skeleton.entry_id;
    let max_return = skeleton.return_ids.iter().copied().max();
    let max_throw = skeleton.dangling_throw_ids.iter().copied().max();
    let range_end = [Some(entry), max_return, max_throw]
        .into_iter()
        .flatten()
        .copied()
        .max()
        .unwrap_or(entry);

    // Step 1+2: collect the method's node range and restrict edges to it.
    let nodes: Vec<_> = unit
        .nodes
        .iter()
        .filter(|n| n.node_id >= entry && n.node_id <= range_end)
        .cloned()
        .collect();
    let mut edges: Vec<CfgEdge> = unit
        .edges
        .iter()
        .filter(|e| e.src >= entry && e.src <= range_end && e.dst >= entry && e.dst <= range_end)
        .cloned()
        .collect();

    // Step 3: every return node gets an edge to the synthetic exit.
    for ret in &skeleton.return_ids {
        edges.push(CfgEdge {
            src: *ret,
            dst: exit_id,
            label: EdgeLabel::Plain,
        });
    }

    // Step 4: dangling throw_statements (no catch in scope) connect
    // straight to the synthetic exit too, since an uncaught throw is
    // an (abnormal) exit from the method. The other half of step 4 —
    // stitching method_declaration nodes nested inside the method
    // (anonymous/local inner classes) back to their textual
    // predecessor — happens in the front end while the statement tree
    // is still being walked (frontend::stitch_nested_methods), since
    // that's the only place the predecessor relationship is known.
    for throw in &skeleton.dangling_throw_ids {
        edges.push(CfgEdge {
            src: *throw,
            dst: exit_id,
            label: EdgeLabel::Plain,
        });
    }

    // Step 5: warn about unreachable nodes (no predecessor other than
    // entry, no successor) without failing the build.
    for node in &nodes {
        if node.node_id == entry {
            continue;
        }
        let has_pred = edges.iter().any(|e| e.dst == node.node_id);
        let has_succ = edges.iter().any(|e| e.src == node.node_id);
        if !has_pred && !has_succ {
            warn!(method = %skeleton.name, node = node.node_id, "unreachable CFG node");
        }
    }

    let vertex_count = nodes.len() + 1; // + synthetic exit
    let edge_count = edges.len();
    let complexity = edge_count as i64 - vertex_count as i64 + 2;

    Some(Method {
        entry_id: entry,
        last_return_id: skeleton.return_ids.last().copied(),
        exit_id,
        nodes,
        edges,
        name: skeleton.name.clone(),
        class_name: skeleton.class_name.clone(),
        cyclomatic_complexity: complexity,
    })
}
