//! Halstead volume metrics from operator and operand counts.

use std::collections::BTreeSet;

use tree_sitter::Node;

use crate::domain::VolumeMetrics;
use crate::error::{ReposcopeError, Result};
use crate::metrics::node_text;

/// Node kinds whose anonymous children are counted as operators.
const OPERATION_KINDS: [&str; 7] = [
    "binary_operator",
    "unary_operator",
    "boolean_operator",
    "comparison_operator",
    "not_operator",
    "augmented_assignment",
    "named_expression",
];

/// Raw operator and operand tallies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HalsteadCounts {
    operators: BTreeSet<String>,
    operands: BTreeSet<String>,
    total_operators: usize,
    total_operands: usize,
}

impl HalsteadCounts {
    fn add_operator(&mut self, token: &str) {
        self.operators.insert(token.to_string());
        self.total_operators += 1;
    }

    fn add_operand(&mut self, token: &str) {
        self.operands.insert(token.to_string());
        self.total_operands += 1;
    }

    /// Derive volume, difficulty and effort.
    ///
    /// Fails when nothing was counted, since the triple is undefined then.
    pub fn metrics(&self) -> Result<VolumeMetrics> {
        let distinct_operators = self.operators.len() as f64;
        let distinct_operands = self.operands.len() as f64;
        let vocabulary = distinct_operators + distinct_operands;
        if vocabulary == 0.0 {
            return Err(ReposcopeError::Other(
                "no operators or operands found".to_string(),
            ));
        }
        let length = (self.total_operators + self.total_operands) as f64;
        let volume = length * vocabulary.log2();
        let difficulty = if distinct_operands == 0.0 {
            0.0
        } else {
            (distinct_operators / 2.0) * (self.total_operands as f64 / distinct_operands)
        };
        Ok(VolumeMetrics::new(volume, difficulty, difficulty * volume))
    }
}

/// Measure a parsed Python tree.
pub(crate) fn measure(root: Node<'_>, source: &str) -> Result<VolumeMetrics> {
    let mut counts = HalsteadCounts::default();
    tally(root, source, &mut counts);
    counts.metrics()
}

fn tally(node: Node<'_>, source: &str, counts: &mut HalsteadCounts) {
    let is_operation = OPERATION_KINDS.contains(&node.kind());
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if is_operation {
            if !child.is_named() {
                if !matches!(child.kind(), "(" | ")" | ",") {
                    counts.add_operator(child.kind());
                }
            } else if child.kind() != "comment" {
                counts.add_operand(node_text(child, source).trim());
            }
        }
        tally(child, source, counts);
    }
}
