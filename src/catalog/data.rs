//! Pure data nodes that read from the world snapshot bound as `this`.

use crate::compiler::Resolution;
use crate::graph::{quote, NodeId, NodeInstance};

pub(super) fn evaluate_input(
    _id: NodeId,
    node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    let key = res.text_param(node, "key");
    let set = match res.text_param(node, "mode").as_str() {
        "pressed" => "pressed",
        _ => "held",
    };
    Some(format!("this.input.{}.contains({})", set, quote(&key)))
}

pub(super) fn evaluate_position(
    _id: NodeId,
    node: &NodeInstance,
    output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    let axis = match output {
        "x" => "x",
        "y" => "y",
        _ => return None,
    };
    let target = res.text_param(node, "target");
    Some(format!("this.objects[{}].position.{}", quote(&target), axis))
}

pub(super) fn evaluate_variable(
    _id: NodeId,
    node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    let name = res.text_param(node, "name");
    Some(format!("(this.variables[{}] ?? 0)", quote(&name)))
}

pub(super) fn evaluate_timer_elapsed(
    _id: NodeId,
    node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    let timer = res.text_param(node, "timer");
    Some(format!("(this.timers[{}]?.elapsed ?? 0.0)", quote(&timer)))
}

/// True while `subject` overlaps `other`, or anything when `other` is empty.
pub(super) fn evaluate_is_colliding(
    _id: NodeId,
    node: &NodeInstance,
    _output: &str,
    res: &mut Resolution<'_>,
) -> Option<String> {
    let subject = quote(&res.text_param(node, "subject"));
    let other = res.text_param(node, "other");
    if other.is_empty() {
        Some(format!("((this.collisions[{}] ?? []).len() > 0)", subject))
    } else {
        Some(format!(
            "(this.collisions[{}] ?? []).contains({})",
            subject,
            quote(&other)
        ))
    }
}
