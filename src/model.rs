//! Core data model shared across the analysis and generation pipeline.
//!
//! Graph-shaped data (CFG nodes/edges) is stored arena-style: nodes and
//! edges live in flat `Vec`s and are referenced by integer id, which
//! sidesteps the cyclic-ownership problems a pointer-based graph would
//! run into.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type NodeId = u32;

/// The class under test. Inputs are treated as immutable for the
/// lifetime of a run.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: std::path::PathBuf,
    pub text: String,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Java,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub node_id: NodeId,
    pub line_index: u32,
    pub text: String,
    pub kind: String,
    pub block_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    PosNext,
    NegNext,
    NextLine(u32),
    CatchException,
    SyncNext,
    Plain,
}

impl std::fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PosNext => write!(f, "true"),
            Self::NegNext => write!(f, "false"),
            Self::NextLine(n) => write!(f, "next_line_{n}"),
            Self::CatchException => write!(f, "catch_exception"),
            Self::SyncNext => write!(f, "after synchronized"),
            Self::Plain => write!(f, "next"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CfgEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub label: EdgeLabel,
}

/// A method-local control-flow graph plus the metadata the rest of the
/// pipeline needs to pick and describe paths through it.
#[derive(Debug, Clone)]
pub struct Method {
    pub entry_id: NodeId,
    pub last_return_id: Option<NodeId>,
    pub exit_id: NodeId,
    pub nodes: Vec<AstNode>,
    pub edges: Vec<CfgEdge>,
    pub name: String,
    pub class_name: String,
    pub cyclomatic_complexity: i64,
}

impl Method {
    pub fn node_count(&self) -> usize {
        self.nodes.len() + 1 // + synthetic exit
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// `testable` iff non-private, non-trivial, non-main, complexity >= 1.
    pub fn is_testable(&self) -> bool {
        self.cyclomatic_complexity >= 1
    }

    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = &CfgEdge> {
        self.edges.iter().filter(move |e| e.src == node)
    }
}

/// An entry-to-exit path through a method-local graph.
#[derive(Debug, Clone)]
pub struct Path {
    pub node_ids: Vec<NodeId>,
    pub edges: Vec<CfgEdge>,
    pub missed_value: usize,
    pub path_label: String,
    pub condition_trace: String,
}

impl Path {
    pub fn new(method_name: &str, entry_id: NodeId, path_index: usize, node_ids: Vec<NodeId>, edges: Vec<CfgEdge>) -> Self {
        Self {
            node_ids,
            edges,
            missed_value: 0,
            path_label: format!("{method_name}_{entry_id}_{path_index}"),
            condition_trace: String::new(),
        }
    }
}

/// Partial, stable mapping between original source lines and CFG nodes.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    pub line_to_node: HashMap<u32, NodeId>,
    pub node_to_lines: HashMap<NodeId, Vec<u32>>,
}

impl LineMap {
    pub fn lines_for(&self, node: NodeId) -> &[u32] {
        self.node_to_lines.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct Coverage {
    pub missed_lines: HashSet<u32>,
    pub missed_branches: HashSet<u32>,
    pub line_pct: f64,
    pub branch_pct: f64,
}

impl Coverage {
    pub fn ratio(missed: usize, covered: usize) -> f64 {
        let total = missed + covered;
        if total == 0 {
            0.0
        } else {
            (covered as f64 / total as f64).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Pass,
    Fail,
    Info,
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub label: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: AttemptStatus,
    pub reason: String,
    pub exit_code: i32,
    pub stderr: String,
    pub stdout_excerpt: String,
    pub test: String,
    pub line_pct: f64,
    pub branch_pct: f64,
}

fn serialize_status<S: serde::Serializer>(s: &AttemptStatus, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&s.to_string())
}

/// `path_label -> visit_count`, process-scoped, reset per run.
#[derive(Debug, Clone, Default)]
pub struct PathHistory {
    visits: HashMap<String, u32>,
}

impl PathHistory {
    pub fn visits(&self, label: &str) -> u32 {
        self.visits.get(label).copied().unwrap_or(0)
    }

    pub fn record_visit(&mut self, label: &str) {
        *self.visits.entry(label.to_string()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GeneratedTest {
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub test_behavior: String,
    #[serde(default)]
    pub test_code: String,
    #[serde(default)]
    pub new_imports_code: String,
}

#[derive(Debug, Clone)]
pub struct FailedTest {
    pub code: GeneratedTest,
    pub error_message: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    /// Open-question bucket: complexity-0 methods that were filtered
    /// out of the production path, kept only for reporting.
    pub complexity_zero_methods: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunitVersion {
    Three,
    Four,
    Five,
}

impl From<u8> for JunitVersion {
    fn from(v: u8) -> Self {
        match v {
            3 => Self::Three,
            5 => Self::Five,
            _ => Self::Four,
        }
    }
}
