//! Branching and evaluation nodes.

use crate::compiler::Resolution;
use crate::graph::{NodeId, NodeInstance};

const COMPARISONS: &[&str] = &["==", "!=", "<", "<=", ">", ">="];
const ARITHMETIC: &[&str] = &["+", "-", "*", "/", "%", "**"];

pub(super) fn emit_if(id: NodeId, _node: &NodeInstance, res: &mut Resolution<'_>) -> String {
    let condition = res
        .expression(id, "condition")
        .unwrap_or_else(|| "false".to_string());
    let then = res.flow(id, "true");
    let otherwise = res.flow(id, "false");

    if otherwise.is_empty() {
        format!("if {} {{\n{}}}\n", condition, then)
    } else {
        format!("if {} {{\n{}}} else {{\n{}}}\n", condition, then, otherwise)
    }
}

/// Picks the node's `operator` parameter if it is one of `allowed`,
/// otherwise the first allowed operator.
fn operator(node: &NodeInstance, res: &Resolution<'_>, allowed: &[&'static str]) -> &'static str {
    let wanted = res.text_param(node, "operator");
    allowed
        .iter()
        .copied()
        .find(|op| *op == wanted)
        .unwrap_or(allowed[0])
}

fn binary(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
    allowed: &[&'static str],
) -> Option<String> {
    let op = operator(node, res, allowed);
    let a = res.operand(id, "A")?;
    let b = res.operand(id, "B")?;
    Some(format!("{} {} {}", a, op, b))
}

pub(super) fn evaluate_operator(
    id: NodeId,
    node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    binary(id, node, res, ARITHMETIC)
}

pub(super) fn evaluate_compare(
    id: NodeId,
    node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    binary(id, node, res, COMPARISONS)
}

pub(super) fn evaluate_not(
    id: NodeId,
    _node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    let value = res.operand(id, "value")?;
    Some(format!("!{}", value))
}
