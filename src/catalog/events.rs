//! Event roots. Each emits one named function whose body is the flow
//! chain hanging off its `flow` output.

use super::EventHook;
use crate::compiler::Resolution;
use crate::graph::{quote, NodeId, NodeInstance};

fn event_function(hook: EventHook, id: NodeId, body: &str, res: &Resolution<'_>) -> String {
    format!(
        "fn {}({}) {{\n{}}}\n",
        res.event_function(hook, id),
        hook.parameters(),
        body
    )
}

pub(super) fn emit_on_start(id: NodeId, _node: &NodeInstance, res: &mut Resolution<'_>) -> String {
    let body = res.flow(id, "flow");
    event_function(EventHook::Start, id, &body, res)
}

pub(super) fn emit_on_update(id: NodeId, _node: &NodeInstance, res: &mut Resolution<'_>) -> String {
    let body = res.flow(id, "flow");
    event_function(EventHook::Update, id, &body, res)
}

/// The body only runs when the colliding pair matches the configured
/// filter. An empty filter side accepts any entity.
pub(super) fn emit_on_collision(
    id: NodeId,
    node: &NodeInstance,
    res: &mut Resolution<'_>,
) -> String {
    let subject = res.text_param(node, "subject");
    let other = res.text_param(node, "other");
    let body = res.flow(id, "flow");

    let guards: Vec<String> = [("subject", &subject), ("other", &other)]
        .into_iter()
        .filter(|(_, wanted)| !wanted.is_empty())
        .map(|(param, wanted)| format!("{} == {}", param, quote(wanted)))
        .collect();

    if guards.is_empty() {
        return event_function(EventHook::Collision, id, &body, res);
    }
    let guarded = format!("if {} {{\n{}}}\n", guards.join(" && "), body);
    event_function(EventHook::Collision, id, &guarded, res)
}
