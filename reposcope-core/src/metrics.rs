//! Complexity metrics for Python sources, computed on a tree-sitter parse.

use tree_sitter::{Node, Parser, Tree};

use crate::domain::{SymbolComplexity, VolumeMetrics};
use crate::error::{ReposcopeError, Result};
use crate::halstead;

/// Computes per-symbol complexity and the Halstead volume triple.
#[cfg_attr(test, mockall::automock)]
pub trait MetricsEngine {
    /// Cyclomatic complexity per class and function, in source order.
    fn complexity(&self, text: &str) -> Result<Vec<SymbolComplexity>>;
    /// Halstead volume, difficulty and effort for the whole text.
    fn volume_metrics(&self, text: &str) -> Result<VolumeMetrics>;
}

/// Metrics engine for Python source files.
#[derive(Debug, Default, Clone)]
pub struct PythonMetricsEngine;

impl PythonMetricsEngine {
    /// Create a new Python metrics engine.
    pub fn new() -> Self {
        Self
    }
}

impl MetricsEngine for PythonMetricsEngine {
    fn complexity(&self, text: &str) -> Result<Vec<SymbolComplexity>> {
        let tree = parse_python(text)?;
        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(ReposcopeError::Parse(format!("invalid syntax at line {line}")));
        }
        let mut symbols = Vec::new();
        let mut scope = Vec::new();
        collect_symbols(root, text, &mut scope, &mut symbols);
        Ok(symbols)
    }

    fn volume_metrics(&self, text: &str) -> Result<VolumeMetrics> {
        let tree = parse_python(text)?;
        halstead::measure(tree.root_node(), text)
    }
}

/// Parse Python source into a syntax tree.
pub(crate) fn parse_python(text: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| ReposcopeError::Other(format!("failed to load Python grammar: {err}")))?;
    parser
        .parse(text, None)
        .ok_or_else(|| ReposcopeError::Parse("parser produced no tree".to_string()))
}

/// Source text covered by a node.
pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or_default()
}

fn first_error_line(node: Node<'_>) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error_line)
}

fn collect_symbols(
    node: Node<'_>,
    source: &str,
    scope: &mut Vec<String>,
    symbols: &mut Vec<SymbolComplexity>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                let name = definition_name(child, source);
                symbols.push(SymbolComplexity::new(
                    qualify(scope, &name),
                    function_score(child),
                ));
                scope.push(name);
                collect_symbols(child, source, scope, symbols);
                scope.pop();
            }
            "class_definition" => {
                let name = definition_name(child, source);
                let position = symbols.len();
                let qualified = qualify(scope, &name);
                scope.push(name);
                collect_symbols(child, source, scope, symbols);
                scope.pop();
                symbols.insert(position, SymbolComplexity::new(qualified, class_score(child)));
            }
            _ => collect_symbols(child, source, scope, symbols),
        }
    }
}

fn function_score(node: Node<'_>) -> u32 {
    1 + node
        .child_by_field_name("body")
        .map(count_decisions)
        .unwrap_or(0)
}

/// Class score: body paths plus method scores, averaged over the methods.
fn class_score(node: Node<'_>) -> u32 {
    let Some(body) = node.child_by_field_name("body") else {
        return 1;
    };
    let mut cursor = body.walk();
    let methods: Vec<u32> = body
        .named_children(&mut cursor)
        .filter_map(|child| match child.kind() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .child_by_field_name("definition")
                .filter(|inner| inner.kind() == "function_definition"),
            _ => None,
        })
        .map(function_score)
        .collect();
    let total = 1 + count_decisions(body) + methods.iter().sum::<u32>();
    match methods.len() as u32 {
        0 | 1 => total,
        count => total / count + 1,
    }
}

fn definition_name(node: Node<'_>, source: &str) -> String {
    node.child_by_field_name("name")
        .map(|name| node_text(name, source).to_string())
        .unwrap_or_else(|| "<anonymous>".to_string())
}

fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        return name.to_string();
    }
    format!("{}.{name}", scope.join("."))
}

/// Decision points inside a body, excluding nested definitions.
fn count_decisions(node: Node<'_>) -> u32 {
    let mut total = 0;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" | "class_definition" => continue,
            kind => total += decision_weight(kind, node.kind()) + count_decisions(child),
        }
    }
    total
}

fn decision_weight(kind: &str, parent_kind: &str) -> u32 {
    match kind {
        "if_statement" | "elif_clause" | "conditional_expression" | "for_statement"
        | "while_statement" | "except_clause" | "except_group_clause" | "with_statement"
        | "assert_statement" | "for_in_clause" | "if_clause" | "boolean_operator"
        | "case_clause" => 1,
        "else_clause" if matches!(parent_kind, "for_statement" | "while_statement") => 1,
        _ => 0,
    }
}
