//! The AST/CFG front end (component C1 in the design).
//!
//! Upstream this is an external collaborator ("a tree-sitter-based
//! front end yielding a typed AST"); this module is the one concrete
//! adapter this crate ships, built directly on `tree-sitter` +
//! `tree-sitter-java`. It walks a parsed Java compilation unit and
//! emits a flat node/edge arena per method plus the bookkeeping the
//! CFG Builder (C2) needs to stitch a method-local graph together.

use crate::model::{AstNode, CfgEdge, EdgeLabel, LineMap, NodeId};
use std::collections::HashMap;
use tree_sitter::{Node as TsNode, Parser};

#[derive(Debug, Clone)]
pub struct MethodSkeleton {
    pub name: String,
    pub class_name: String,
    pub entry_id: NodeId,
    pub return_ids: Vec<NodeId>,
    pub dangling_throw_ids: Vec<NodeId>,
    pub is_private: bool,
    pub is_static_main: bool,
    pub is_trivial: bool,
}

#[derive(Debug, Default)]
pub struct ParsedUnit {
    pub nodes: Vec<AstNode>,
    pub edges: Vec<CfgEdge>,
    pub methods: Vec<MethodSkeleton>,
    pub line_map: LineMap,
    pub last_import_line: u32,
    pub package_name: Option<String>,
}

struct Builder<'a> {
    src: &'a str,
    nodes: Vec<AstNode>,
    edges: Vec<CfgEdge>,
    next_id: NodeId,
    block_index: u32,
}

impl<'a> Builder<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            nodes: Vec::new(),
            edges: Vec::new(),
            next_id: 0,
            block_index: 0,
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_node(&mut self, line_index: u32, text: &str, kind: &str) -> NodeId {
        let id = self.fresh_id();
        self.nodes.push(AstNode {
            node_id: id,
            line_index,
            text: text.to_string(),
            kind: kind.to_string(),
            block_index: self.block_index,
        });
        id
    }

    fn edge(&mut self, src: NodeId, dst: NodeId, label: EdgeLabel) {
        self.edges.push(CfgEdge { src, dst, label });
    }

    fn text_of(&self, node: TsNode) -> &'a str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    fn line_of(&self, node: TsNode) -> u32 {
        node.start_position().row as u32 + 1
    }
}

/// Entry/exit handle for a chain of statement nodes: every statement
/// CFG subgraph is built as a small DAG with one or more open "tail"
/// edges that the caller links onward.
struct Chain {
    entry: NodeId,
    /// nodes with no successor yet, paired with the label that should
    /// be used for the edge connecting them onward
    open_tails: Vec<(NodeId, EdgeLabel)>,
}

pub fn parse_java(src: &str) -> Result<ParsedUnit, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| format!("failed to set tree-sitter language: {e}"))?;
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| "tree-sitter failed to parse source".to_string())?;
    let root = tree.root_node();

    let mut b = Builder::new(src);
    let mut methods = Vec::new();
    let mut last_import_line = 0u32;
    let mut package_name = None;

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                let text = b.text_of(child);
                package_name = extract_package_name(text);
            }
            "import_declaration" => {
                last_import_line = last_import_line.max(b.line_of(child));
            }
            "class_declaration" | "interface_declaration" => {
                walk_class_body(&mut b, child, &mut methods, &mut last_import_line);
            }
            _ => {}
        }
    }

    let line_map = build_line_map(&b.nodes);

    Ok(ParsedUnit {
        nodes: b.nodes,
        edges: b.edges,
        methods,
        line_map,
        last_import_line,
        package_name,
    })
}

fn extract_package_name(decl_text: &str) -> Option<String> {
    // `package com.example.foo;`
    let rest = decl_text.trim().strip_prefix("package")?.trim();
    let rest = rest.trim_end_matches(';').trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

fn class_name_of(node: TsNode, src: &str) -> String {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(src.as_bytes()).ok())
        .unwrap_or("Unknown")
        .to_string()
}

fn walk_class_body(
    b: &mut Builder,
    class_node: TsNode,
    methods: &mut Vec<MethodSkeleton>,
    last_import_line: &mut u32,
) {
    let class_name = class_name_of(class_node, b.src);
    let Some(body) = class_node.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() == "method_declaration" || member.kind() == "constructor_declaration" {
            if let Some(m) = build_method(b, member, &class_name) {
                methods.push(m);
            }
        } else if member.kind() == "class_declaration" {
            walk_class_body(b, member, methods, last_import_line);
        }
    }
}

fn is_private(node: TsNode, src: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let text = child.utf8_text(src.as_bytes()).unwrap_or("");
            return text.contains("private");
        }
    }
    false
}

fn is_static(node: TsNode, src: &str) -> bool {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "modifiers" {
            let text = child.utf8_text(src.as_bytes()).unwrap_or("");
            return text.contains("static");
        }
    }
    false
}

fn method_name(node: TsNode, src: &str) -> String {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(src.as_bytes()).ok())
        .unwrap_or("unknown")
        .to_string()
}

fn is_trivial_body(body: Option<TsNode>, name: &str) -> bool {
    let Some(body) = body else {
        return true; // abstract/interface method, no body
    };
    let mut cursor = body.walk();
    let stmts: Vec<_> = body.named_children(&mut cursor).collect();
    if stmts.is_empty() {
        return true;
    }
    if stmts.len() == 1 {
        // single-statement getter/setter/boolean-is heuristic
        let lname = name.to_lowercase();
        if lname.starts_with("get") || lname.starts_with("set") || lname.starts_with("is") {
            return true;
        }
    }
    false
}

fn build_method(b: &mut Builder, node: TsNode, class_name: &str) -> Option<MethodSkeleton> {
    let name = method_name(node, b.src);
    let body = node.child_by_field_name("body");
    let is_priv = is_private(node, b.src);
    let is_static_main = is_static(node, b.src) && name == "main";
    let trivial = is_trivial_body(body, &name);

    b.block_index += 1;
    let entry_line = b.line_of(node);
    let entry_id = b.push_node(entry_line, &name, "method_entry");

    let mut returns = Vec::new();
    let mut dangling_throws = Vec::new();

    if let Some(body) = body {
        let chain = build_block(b, body, &mut returns, &mut dangling_throws);
        b.edge(entry_id, chain.entry, EdgeLabel::Plain);
        // open tails of the method body dangle (implicit fall-through
        // return at the end of a void method); treat them as returns.
        for (tail, _) in chain.open_tails {
            returns.push(tail);
        }
    }

    Some(MethodSkeleton {
        name,
        class_name: class_name.to_string(),
        entry_id,
        return_ids: returns,
        dangling_throw_ids: dangling_throws,
        is_private: is_priv,
        is_static_main,
        is_trivial: trivial,
    })
}

fn build_block(
    b: &mut Builder,
    block: TsNode,
    returns: &mut Vec<NodeId>,
    dangling_throws: &mut Vec<NodeId>,
) -> Chain {
    let mut cursor = block.walk();
    let stmts: Vec<_> = block.named_children(&mut cursor).collect();
    build_statement_sequence(b, &stmts, returns, dangling_throws)
}

fn build_statement_sequence(
    b: &mut Builder,
    stmts: &[TsNode],
    returns: &mut Vec<NodeId>,
    dangling_throws: &mut Vec<NodeId>,
) -> Chain {
    let mut entry = None;
    let mut open_tails: Vec<(NodeId, EdgeLabel)> = Vec::new();

    for stmt in stmts {
        let chain = build_statement(b, *stmt, returns, dangling_throws);
        if entry.is_none() {
            entry = Some(chain.entry);
        } else {
            for (tail, label) in open_tails.drain(..) {
                b.edge(tail, chain.entry, label);
            }
        }
        open_tails = chain.open_tails;
        if open_tails.is_empty() {
            // statement terminates control flow (return/throw with no
            // fallthrough); nothing further in this sequence is
            // reachable, stop linking (still emit remaining nodes is
            // unnecessary for CFG purposes).
            break;
        }
    }

    match entry {
        Some(entry) => Chain {
            entry,
            open_tails,
        },
        None => {
            // empty sequence: synthesize a no-op passthrough node
            let id = b.push_node(0, "", "empty_block");
            Chain {
                entry: id,
                open_tails: vec![(id, EdgeLabel::Plain)],
            }
        }
    }
}

fn build_statement(
    b: &mut Builder,
    stmt: TsNode,
    returns: &mut Vec<NodeId>,
    dangling_throws: &mut Vec<NodeId>,
) -> Chain {
    match stmt.kind() {
        "if_statement" => build_if(b, stmt, returns, dangling_throws),
        "for_statement" | "enhanced_for_statement" => build_loop(b, stmt, returns, dangling_throws, "next_line 2"),
        "while_statement" => build_loop(b, stmt, returns, dangling_throws, "next_line 2"),
        "do_statement" => build_loop(b, stmt, returns, dangling_throws, "next_line 2"),
        "try_statement" => build_try(b, stmt, returns, dangling_throws),
        "return_statement" => {
            let line = b.line_of(stmt);
            let text = b.text_of(stmt);
            let id = b.push_node(line, text, "return_statement");
            returns.push(id);
            stitch_nested_methods(b, stmt, id);
            Chain {
                entry: id,
                open_tails: Vec::new(),
            }
        }
        "throw_statement" => {
            let line = b.line_of(stmt);
            let text = b.text_of(stmt);
            let id = b.push_node(line, text, "throw_statement");
            dangling_throws.push(id);
            stitch_nested_methods(b, stmt, id);
            Chain {
                entry: id,
                open_tails: Vec::new(),
            }
        }
        "block" => build_block(b, stmt, returns, dangling_throws),
        _ => {
            let line = b.line_of(stmt);
            let text = b.text_of(stmt);
            let kind = stmt.kind().to_string();
            let id = b.push_node(line, text, &kind);
            stitch_nested_methods(b, stmt, id);
            Chain {
                entry: id,
                open_tails: vec![(id, EdgeLabel::Plain)],
            }
        }
    }
}

/// Find `method_declaration` nodes nested inside `stmt` (an anonymous
/// inner class body or a local class declaration) — these are not
/// reached by `walk_class_body`, which only recurses into top-level
/// class/interface members.
fn collect_nested_methods<'a>(node: TsNode<'a>) -> Vec<TsNode<'a>> {
    let mut found = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "method_declaration" {
            found.push(child);
        }
        found.extend(collect_nested_methods(child));
    }
    found
}

/// Collect `return_statement` nodes directly inside a nested method's
/// body, not descending into any method declared inside it in turn.
fn collect_return_statements(b: &mut Builder, body: TsNode) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() == "return_statement" {
            let line = b.line_of(child);
            let text = b.text_of(child);
            out.push(b.push_node(line, text, "return_statement"));
        } else if child.kind() != "method_declaration" {
            out.extend(collect_return_statements(b, child));
        }
    }
    out
}

/// §4.2 step 4: a `method_declaration` nested inside the enclosing
/// method (a lambda's desugared body or an anonymous/local inner
/// class) has no place of its own in the linear control flow — stitch
/// it to the textual predecessor and fold its returns back into that
/// same predecessor, so it neither breaks reachability nor is lost
/// from the graph.
fn stitch_nested_methods(b: &mut Builder, stmt: TsNode, predecessor: NodeId) {
    for nested in collect_nested_methods(stmt) {
        let name = method_name(nested, b.src);
        let entry_line = b.line_of(nested);
        let entry_id = b.push_node(entry_line, &name, "nested_method_entry");
        b.edge(predecessor, entry_id, EdgeLabel::Plain);

        let returns = match nested.child_by_field_name("body") {
            Some(body) => collect_return_statements(b, body),
            None => Vec::new(),
        };
        if returns.is_empty() {
            b.edge(entry_id, predecessor, EdgeLabel::Plain);
        } else {
            for ret_id in returns {
                b.edge(ret_id, predecessor, EdgeLabel::Plain);
            }
        }
    }
}

fn build_if(
    b: &mut Builder,
    stmt: TsNode,
    returns: &mut Vec<NodeId>,
    dangling_throws: &mut Vec<NodeId>,
) -> Chain {
    let line = b.line_of(stmt);
    let cond_text = stmt
        .child_by_field_name("condition")
        .map(|n| b.text_of(n))
        .unwrap_or("");
    let cond_id = b.push_node(line, cond_text, "if_statement");

    let mut open_tails = Vec::new();

    if let Some(consequence) = stmt.child_by_field_name("consequence") {
        let then_chain = build_statement(b, consequence, returns, dangling_throws);
        b.edge(cond_id, then_chain.entry, EdgeLabel::PosNext);
        open_tails.extend(then_chain.open_tails);
    }

    if let Some(alt) = stmt.child_by_field_name("alternative") {
        let else_chain = build_statement(b, alt, returns, dangling_throws);
        b.edge(cond_id, else_chain.entry, EdgeLabel::NegNext);
        open_tails.extend(else_chain.open_tails);
    } else {
        // no else branch: condition itself is an open tail under the
        // false label, matching the "after if block" join semantics.
        open_tails.push((cond_id, EdgeLabel::NegNext));
    }

    Chain {
        entry: cond_id,
        open_tails,
    }
}

fn build_loop(
    b: &mut Builder,
    stmt: TsNode,
    returns: &mut Vec<NodeId>,
    dangling_throws: &mut Vec<NodeId>,
    _after_label: &str,
) -> Chain {
    let line = b.line_of(stmt);
    let text = b.text_of(stmt);
    let cond_id = b.push_node(line, text, stmt.kind());

    if let Some(body) = stmt.child_by_field_name("body") {
        let body_chain = build_statement(b, body, returns, dangling_throws);
        b.edge(cond_id, body_chain.entry, EdgeLabel::PosNext);
        for (tail, label) in body_chain.open_tails {
            // loop back-edge
            b.edge(tail, cond_id, label);
        }
    }

    Chain {
        entry: cond_id,
        open_tails: vec![(cond_id, EdgeLabel::NegNext)],
    }
}

fn build_try(
    b: &mut Builder,
    stmt: TsNode,
    returns: &mut Vec<NodeId>,
    dangling_throws: &mut Vec<NodeId>,
) -> Chain {
    let mut open_tails = Vec::new();
    let mut try_throws = Vec::new();

    let body = stmt.child_by_field_name("body");
    let try_chain = match body {
        Some(body) => build_block(b, body, returns, &mut try_throws),
        None => {
            let id = b.push_node(b.line_of(stmt), "", "empty_block");
            Chain {
                entry: id,
                open_tails: vec![(id, EdgeLabel::Plain)],
            }
        }
    };
    open_tails.extend(try_chain.open_tails);

    let mut cursor = stmt.walk();
    let catch_clauses: Vec<_> = stmt
        .children(&mut cursor)
        .filter(|n| n.kind() == "catch_clause")
        .collect();

    if catch_clauses.is_empty() {
        dangling_throws.extend(try_throws);
    } else {
        for catch in &catch_clauses {
            if let Some(catch_body) = catch.child_by_field_name("body") {
                let catch_chain = build_block(b, catch_body, returns, dangling_throws);
                for throw_id in &try_throws {
                    b.edge(*throw_id, catch_chain.entry, EdgeLabel::CatchException);
                }
                open_tails.extend(catch_chain.open_tails);
            }
        }
    }

    if let Some(finally) = stmt.child_by_field_name("finally") {
        if let Some(finally_body) = finally.child_by_field_name("body") {
            let finally_chain = build_block(b, finally_body, returns, dangling_throws);
            for (tail, label) in open_tails.drain(..) {
                b.edge(tail, finally_chain.entry, label);
            }
            open_tails = finally_chain.open_tails;
        }
    }

    let entry = try_chain.entry;
    Chain {
        entry,
        open_tails,
    }
}

fn build_line_map(nodes: &[AstNode]) -> LineMap {
    let mut line_to_node = HashMap::new();
    let mut node_to_lines: HashMap<NodeId, Vec<u32>> = HashMap::new();
    for node in nodes {
        if node.line_index == 0 {
            continue;
        }
        line_to_node.entry(node.line_index).or_insert(node.node_id);
        node_to_lines.entry(node.node_id).or_default().push(node.line_index);
    }
    LineMap {
        line_to_node,
        node_to_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUARD: &str = r#"
package com.example;

public class Foo {
    public int f(int x) {
        if (x > 0) {
            return 1;
        }
        return 0;
    }
}
"#;

    #[test]
    fn parses_simple_guard_method() {
        let unit = parse_java(GUARD).unwrap();
        assert_eq!(unit.package_name.as_deref(), Some("com.example"));
        assert_eq!(unit.methods.len(), 1);
        let m = &unit.methods[0];
        assert_eq!(m.name, "f");
        assert!(!m.is_private);
        assert!(!m.is_trivial);
        assert_eq!(m.return_ids.len(), 2);
    }

    #[test]
    fn private_getter_is_trivial() {
        let src = r#"
public class Foo {
    private int getX() { return x; }
}
"#;
        let unit = parse_java(src).unwrap();
        let m = &unit.methods[0];
        assert!(m.is_private);
        assert!(m.is_trivial);
    }

    #[test]
    fn anonymous_inner_class_method_is_stitched_back_to_its_statement() {
        let src = r#"
public class Foo {
    public void schedule() {
        Runnable r = new Runnable() {
            public void run() {
                System.out.println("tick");
                return;
            }
        };
        r.run();
    }
}
"#;
        let unit = parse_java(src).unwrap();
        let m = &unit.methods[0];
        let nested_entry = unit
            .nodes
            .iter()
            .find(|n| n.kind == "nested_method_entry")
            .expect("nested method_declaration should be captured");
        assert_eq!(nested_entry.text, "run");

        let forward_edge = unit
            .edges
            .iter()
            .find(|e| e.dst == nested_entry.node_id)
            .expect("predecessor should stitch forward into the nested method");
        let predecessor = forward_edge.src;

        let return_edge_back = unit
            .edges
            .iter()
            .any(|e| e.src != nested_entry.node_id && e.dst == predecessor && e.src != predecessor);
        assert!(return_edge_back, "nested method's return should stitch back to the same predecessor");
        let _ = m;
    }
}
