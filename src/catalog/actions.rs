//! Statement nodes that mutate the world and continue the flow chain.

use crate::compiler::Resolution;
use crate::graph::{quote, NodeId, NodeInstance};

/// Script path of the entity named by the node's `target` parameter.
fn entity(node: &NodeInstance, res: &Resolution<'_>) -> String {
    format!("this.objects[{}]", quote(&res.text_param(node, "target")))
}

fn number(res: &mut Resolution<'_>, id: NodeId, socket: &str) -> String {
    res.expression(id, socket).unwrap_or_else(|| "0".to_string())
}

/// Statements followed by whatever the `flow` output leads to.
fn then_continue(id: NodeId, mut code: String, res: &mut Resolution<'_>) -> String {
    code.push_str(&res.flow(id, "flow"));
    code
}

pub(super) fn emit_move(id: NodeId, node: &NodeInstance, res: &mut Resolution<'_>) -> String {
    let target = entity(node, res);
    let dx = number(res, id, "dx");
    let dy = number(res, id, "dy");
    let code = format!(
        "{t}.position.x += {dx};\n{t}.position.y += {dy};\n",
        t = target,
        dx = dx,
        dy = dy
    );
    then_continue(id, code, res)
}

pub(super) fn emit_rotate(id: NodeId, node: &NodeInstance, res: &mut Resolution<'_>) -> String {
    let target = entity(node, res);
    let angle = number(res, id, "angle");
    then_continue(id, format!("{}.rotation += {};\n", target, angle), res)
}

/// Axes without a value (unwired and no parameter) are left untouched.
pub(super) fn emit_set_position(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let target = entity(node, res);
    let mut code = String::new();
    for axis in ["x", "y"] {
        if let Some(value) = res.expression(id, axis) {
            code.push_str(&format!("{}.position.{} = {};\n", target, axis, value));
        }
    }
    then_continue(id, code, res)
}

/// Velocity and acceleration only exist on physics entities.
fn physics_guarded(target: &str, statements: &str) -> String {
    format!("if {}.kind == \"Physics\" {{\n{}}}\n", target, statements)
}

pub(super) fn emit_set_velocity(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let target = entity(node, res);
    let mut statements = String::new();
    for (socket, axis) in [("vx", "x"), ("vy", "y")] {
        if let Some(value) = res.expression(id, socket) {
            statements.push_str(&format!("{}.velocity.{} = {};\n", target, axis, value));
        }
    }
    let code = if statements.is_empty() {
        statements
    } else {
        physics_guarded(&target, &statements)
    };
    then_continue(id, code, res)
}

pub(super) fn emit_apply_force(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let target = entity(node, res);
    let fx = number(res, id, "fx");
    let fy = number(res, id, "fy");
    let statements = format!(
        "{t}.acceleration.x += {fx};\n{t}.acceleration.y += {fy};\n",
        t = target,
        fx = fx,
        fy = fy
    );
    then_continue(id, physics_guarded(&target, &statements), res)
}

pub(super) fn emit_set_variable(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let name = quote(&res.text_param(node, "name"));
    let value = number(res, id, "value");
    then_continue(id, format!("this.variables[{}] = {};\n", name, value), res)
}

pub(super) fn emit_start_timer(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let timer = quote(&res.text_param(node, "timer"));
    then_continue(
        id,
        format!("this.timers[{}] = #{{ elapsed: 0.0, active: true }};\n", timer),
        res,
    )
}

pub(super) fn emit_stop_timer(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let timer = quote(&res.text_param(node, "timer"));
    let code = format!(
        "if this.timers.contains({t}) {{\nthis.timers[{t}].active = false;\n}}\n",
        t = timer
    );
    then_continue(id, code, res)
}

pub(super) fn emit_show_text(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let label = quote(&res.text_param(node, "text"));
    let content = res.operand(id, "content").unwrap_or_else(|| "\"\"".to_string());
    let x = number(res, id, "x");
    let y = number(res, id, "y");
    let size = res
        .parameter(node, "size")
        .map(|v| v.to_expression())
        .unwrap_or_else(|| "16".to_string());
    let color = quote(&res.text_param(node, "color"));
    let code = format!(
        concat!(
            "this.texts[{}] = #{{ content: \"\" + {}, ",
            "position: #{{ x: {}, y: {} }}, size: {}, color: {} }};\n"
        ),
        label, content, x, y, size, color
    );
    then_continue(id, code, res)
}

pub(super) fn emit_hide_text(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let label = quote(&res.text_param(node, "text"));
    then_continue(id, format!("this.texts.remove({});\n", label), res)
}

pub(super) fn emit_end_game(
    _id: NodeId,
    _node: &NodeInstance,
    _res: &mut Resolution<'_>,
) -> String {
    "end_game();\n".to_string()
}
