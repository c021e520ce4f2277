//! Node catalog: the static registry of node kinds.
//!
//! Every kind is a variant of the closed [`NodeKind`] enum and owns exactly
//! one [`NodeDefinition`] in the handler table below. A definition declares
//! the kind's sockets, its statement emitter, an optional pure expression
//! evaluator and default parameter values. The resolver and the code
//! generator need nothing else from a node.
//!
//! # Categories
//!
//! - **Event**: roots of generated functions (`OnStart`, `OnUpdate`, `OnCollision`)
//! - **Logic**: branching and boolean/arithmetic evaluation
//! - **Data**: pure expressions read from the world or literals
//! - **Action**: statements that mutate the world
//!
//! # Adding a kind
//!
//! Add a `NodeKind` variant, give it a name in [`NodeKind::as_str`], write its
//! emitter (and evaluator for data-producing kinds) in the matching submodule
//! and append a `NodeDefinition` to `DEFINITIONS`.

mod actions;
mod data;
mod events;
mod logic;

use crate::compiler::Resolution;
use crate::graph::{
    NodeId, NodeInstance, ParamValue, SocketDescriptor, SocketDirection, SocketType,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every node kind known to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // Events
    OnStart,
    OnUpdate,
    OnCollision,
    // Logic
    If,
    Compare,
    Not,
    Operator,
    // Data
    Constant,
    Text,
    Input,
    Position,
    Variable,
    TimerElapsed,
    IsColliding,
    // Actions
    Move,
    Rotate,
    SetPosition,
    SetVelocity,
    ApplyForce,
    SetVariable,
    StartTimer,
    StopTimer,
    ShowText,
    HideText,
    EndGame,
}

impl NodeKind {
    /// The name used for this kind in serialized graphs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::OnStart => "OnStart",
            NodeKind::OnUpdate => "OnUpdate",
            NodeKind::OnCollision => "OnCollision",
            NodeKind::If => "If",
            NodeKind::Compare => "Compare",
            NodeKind::Not => "Not",
            NodeKind::Operator => "Operator",
            NodeKind::Constant => "Constant",
            NodeKind::Text => "Text",
            NodeKind::Input => "Input",
            NodeKind::Position => "Position",
            NodeKind::Variable => "Variable",
            NodeKind::TimerElapsed => "TimerElapsed",
            NodeKind::IsColliding => "IsColliding",
            NodeKind::Move => "Move",
            NodeKind::Rotate => "Rotate",
            NodeKind::SetPosition => "SetPosition",
            NodeKind::SetVelocity => "SetVelocity",
            NodeKind::ApplyForce => "ApplyForce",
            NodeKind::SetVariable => "SetVariable",
            NodeKind::StartTimer => "StartTimer",
            NodeKind::StopTimer => "StopTimer",
            NodeKind::ShowText => "ShowText",
            NodeKind::HideText => "HideText",
            NodeKind::EndGame => "EndGame",
        }
    }

    /// Look a kind up by its serialized name.
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeCatalog::global().get(name).map(|def| def.kind)
    }

    /// Which entry point this kind roots, if it is an event.
    pub fn event_hook(&self) -> Option<EventHook> {
        match self {
            NodeKind::OnStart => Some(EventHook::Start),
            NodeKind::OnUpdate => Some(EventHook::Update),
            NodeKind::OnCollision => Some(EventHook::Collision),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad grouping of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    Event,
    Action,
    Logic,
    Data,
}

/// The three entry points a generated script exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventHook {
    /// Called once from `init()`.
    Start,
    /// Called every tick from `update(delta)`.
    Update,
    /// Called from `on_collision(subject, other)` on collision enter.
    Collision,
}

impl EventHook {
    pub fn prefix(&self) -> &'static str {
        match self {
            EventHook::Start => "start",
            EventHook::Update => "update",
            EventHook::Collision => "collision",
        }
    }

    /// Parameter list of the generated per-node function.
    pub fn parameters(&self) -> &'static str {
        match self {
            EventHook::Start => "",
            EventHook::Update => "delta",
            EventHook::Collision => "subject, other",
        }
    }
}

/// A const-constructible default parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(&'static str),
    Bool(bool),
}

impl Literal {
    pub fn to_param(self) -> ParamValue {
        match self {
            Literal::Number(n) => ParamValue::Number(n),
            Literal::Text(s) => ParamValue::Text(s.to_string()),
            Literal::Bool(b) => ParamValue::Bool(b),
        }
    }
}

/// Produces the statements for a node reached through flow.
pub type EmitFn = fn(NodeId, &NodeInstance, &mut Resolution<'_>) -> String;

/// Produces the expression for one output socket of a pure data node.
pub type EvaluateFn = fn(NodeId, &NodeInstance, &str, &mut Resolution<'_>) -> Option<String>;

/// Static description of a node kind.
pub struct NodeDefinition {
    pub kind: NodeKind,
    /// Human-readable name.
    pub name: &'static str,
    pub category: NodeCategory,
    pub sockets: &'static [SocketDescriptor],
    pub emit: EmitFn,
    pub evaluate: Option<EvaluateFn>,
    pub defaults: &'static [(&'static str, Literal)],
}

impl NodeDefinition {
    pub fn inputs(&self) -> impl Iterator<Item = &SocketDescriptor> {
        self.sockets
            .iter()
            .filter(|s| s.direction == SocketDirection::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &SocketDescriptor> {
        self.sockets
            .iter()
            .filter(|s| s.direction == SocketDirection::Output)
    }

    pub fn socket(&self, name: &str, direction: SocketDirection) -> Option<&SocketDescriptor> {
        self.sockets
            .iter()
            .find(|s| s.direction == direction && s.name == name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.socket(name, SocketDirection::Output).is_some()
    }

    /// Data inputs (non-flow) declared by this kind.
    pub fn data_inputs(&self) -> impl Iterator<Item = &SocketDescriptor> {
        self.inputs().filter(|s| !s.ty.is_flow())
    }

    /// Event roots begin a top-level behavior and accept no flow input.
    pub fn is_event_root(&self) -> bool {
        self.category == NodeCategory::Event && !self.inputs().any(|s| s.ty.is_flow())
    }

    /// The declared default for a parameter.
    pub fn default_param(&self, name: &str) -> Option<ParamValue> {
        self.defaults
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_param())
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field("sockets", &self.sockets.len())
            .field("evaluates", &self.evaluate.is_some())
            .finish()
    }
}

/// Registry of node definitions.
#[derive(Debug)]
pub struct NodeCatalog {
    definitions: &'static [NodeDefinition],
}

static CATALOG: NodeCatalog = NodeCatalog {
    definitions: DEFINITIONS,
};

impl NodeCatalog {
    /// The process-wide catalog.
    pub fn global() -> &'static NodeCatalog {
        &CATALOG
    }

    pub fn get(&self, kind: &str) -> Option<&'static NodeDefinition> {
        self.definitions.iter().find(|def| def.kind.as_str() == kind)
    }

    pub fn definition(&self, kind: NodeKind) -> &'static NodeDefinition {
        // Every variant has a table entry; see `test_every_kind_registered`.
        self.definitions
            .iter()
            .find(|def| def.kind == kind)
            .unwrap_or(&DEFINITIONS[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static NodeDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

use SocketType::{Boolean, Flow, Number, String as Str};

const FLOW_IN: SocketDescriptor = SocketDescriptor::input("flow", Flow);
const FLOW_OUT: SocketDescriptor = SocketDescriptor::output("flow", Flow);

static DEFINITIONS: &[NodeDefinition] = &[
    // ===== Events =====
    NodeDefinition {
        kind: NodeKind::OnStart,
        name: "On start",
        category: NodeCategory::Event,
        sockets: &[FLOW_OUT],
        emit: events::emit_on_start,
        evaluate: None,
        defaults: &[],
    },
    NodeDefinition {
        kind: NodeKind::OnUpdate,
        name: "On update",
        category: NodeCategory::Event,
        sockets: &[FLOW_OUT],
        emit: events::emit_on_update,
        evaluate: None,
        defaults: &[],
    },
    NodeDefinition {
        kind: NodeKind::OnCollision,
        name: "On collision",
        category: NodeCategory::Event,
        sockets: &[FLOW_OUT],
        emit: events::emit_on_collision,
        evaluate: None,
        defaults: &[("subject", Literal::Text("")), ("other", Literal::Text(""))],
    },
    // ===== Logic =====
    NodeDefinition {
        kind: NodeKind::If,
        name: "If",
        category: NodeCategory::Logic,
        sockets: &[
            FLOW_IN,
            SocketDescriptor::input("condition", Boolean),
            SocketDescriptor::output("true", Flow),
            SocketDescriptor::output("false", Flow),
        ],
        emit: logic::emit_if,
        evaluate: None,
        defaults: &[],
    },
    NodeDefinition {
        kind: NodeKind::Compare,
        name: "Compare",
        category: NodeCategory::Logic,
        sockets: &[
            SocketDescriptor::input("A", Number),
            SocketDescriptor::input("B", Number),
            SocketDescriptor::output("result", Boolean),
        ],
        emit: emit_nothing,
        evaluate: Some(logic::evaluate_compare),
        defaults: &[
            ("operator", Literal::Text("==")),
            ("A", Literal::Number(0.0)),
            ("B", Literal::Number(0.0)),
        ],
    },
    NodeDefinition {
        kind: NodeKind::Not,
        name: "Not",
        category: NodeCategory::Logic,
        sockets: &[
            SocketDescriptor::input("value", Boolean),
            SocketDescriptor::output("result", Boolean),
        ],
        emit: emit_nothing,
        evaluate: Some(logic::evaluate_not),
        defaults: &[],
    },
    NodeDefinition {
        kind: NodeKind::Operator,
        name: "Operator",
        category: NodeCategory::Logic,
        sockets: &[
            SocketDescriptor::input("A", Number),
            SocketDescriptor::input("B", Number),
            SocketDescriptor::output("result", Number),
        ],
        emit: emit_nothing,
        evaluate: Some(logic::evaluate_operator),
        defaults: &[
            ("operator", Literal::Text("+")),
            ("A", Literal::Number(0.0)),
            ("B", Literal::Number(0.0)),
        ],
    },
    // ===== Data =====
    NodeDefinition {
        kind: NodeKind::Constant,
        name: "Constant",
        category: NodeCategory::Data,
        sockets: &[SocketDescriptor::output("value", Number)],
        emit: emit_nothing,
        evaluate: None,
        defaults: &[("value", Literal::Number(10.0))],
    },
    NodeDefinition {
        kind: NodeKind::Text,
        name: "Text",
        category: NodeCategory::Data,
        sockets: &[SocketDescriptor::output("value", Str)],
        emit: emit_nothing,
        evaluate: None,
        defaults: &[("value", Literal::Text(""))],
    },
    NodeDefinition {
        kind: NodeKind::Input,
        name: "Input",
        category: NodeCategory::Data,
        sockets: &[SocketDescriptor::output("value", Boolean)],
        emit: emit_nothing,
        evaluate: Some(data::evaluate_input),
        defaults: &[
            ("key", Literal::Text("ArrowRight")),
            ("mode", Literal::Text("held")),
        ],
    },
    NodeDefinition {
        kind: NodeKind::Position,
        name: "Position",
        category: NodeCategory::Data,
        sockets: &[
            SocketDescriptor::output("x", Number),
            SocketDescriptor::output("y", Number),
        ],
        emit: emit_nothing,
        evaluate: Some(data::evaluate_position),
        defaults: &[("target", Literal::Text("player"))],
    },
    NodeDefinition {
        kind: NodeKind::Variable,
        name: "Variable",
        category: NodeCategory::Data,
        sockets: &[SocketDescriptor::output("value", Number)],
        emit: emit_nothing,
        evaluate: Some(data::evaluate_variable),
        defaults: &[("name", Literal::Text("score"))],
    },
    NodeDefinition {
        kind: NodeKind::TimerElapsed,
        name: "Timer elapsed",
        category: NodeCategory::Data,
        sockets: &[SocketDescriptor::output("elapsed", Number)],
        emit: emit_nothing,
        evaluate: Some(data::evaluate_timer_elapsed),
        defaults: &[("timer", Literal::Text("timer"))],
    },
    NodeDefinition {
        kind: NodeKind::IsColliding,
        name: "Is colliding",
        category: NodeCategory::Data,
        sockets: &[SocketDescriptor::output("value", Boolean)],
        emit: emit_nothing,
        evaluate: Some(data::evaluate_is_colliding),
        defaults: &[
            ("subject", Literal::Text("player")),
            ("other", Literal::Text("")),
        ],
    },
    // ===== Actions =====
    NodeDefinition {
        kind: NodeKind::Move,
        name: "Move",
        category: NodeCategory::Action,
        sockets: &[
            FLOW_IN,
            SocketDescriptor::input("dx", Number),
            SocketDescriptor::input("dy", Number),
            FLOW_OUT,
        ],
        emit: actions::emit_move,
        evaluate: None,
        defaults: &[("target", Literal::Text("player"))],
    },
    NodeDefinition {
        kind: NodeKind::Rotate,
        name: "Rotate",
        category: NodeCategory::Action,
        sockets: &[FLOW_IN, SocketDescriptor::input("angle", Number), FLOW_OUT],
        emit: actions::emit_rotate,
        evaluate: None,
        defaults: &[("target", Literal::Text("player"))],
    },
    NodeDefinition {
        kind: NodeKind::SetPosition,
        name: "Set position",
        category: NodeCategory::Action,
        sockets: &[
            FLOW_IN,
            SocketDescriptor::input("x", Number),
            SocketDescriptor::input("y", Number),
            FLOW_OUT,
        ],
        emit: actions::emit_set_position,
        evaluate: None,
        defaults: &[("target", Literal::Text("player"))],
    },
    NodeDefinition {
        kind: NodeKind::SetVelocity,
        name: "Set velocity",
        category: NodeCategory::Action,
        sockets: &[
            FLOW_IN,
            SocketDescriptor::input("vx", Number),
            SocketDescriptor::input("vy", Number),
            FLOW_OUT,
        ],
        emit: actions::emit_set_velocity,
        evaluate: None,
        defaults: &[("target", Literal::Text("player"))],
    },
    NodeDefinition {
        kind: NodeKind::ApplyForce,
        name: "Apply force",
        category: NodeCategory::Action,
        sockets: &[
            FLOW_IN,
            SocketDescriptor::input("fx", Number),
            SocketDescriptor::input("fy", Number),
            FLOW_OUT,
        ],
        emit: actions::emit_apply_force,
        evaluate: None,
        defaults: &[("target", Literal::Text("player"))],
    },
    NodeDefinition {
        kind: NodeKind::SetVariable,
        name: "Set variable",
        category: NodeCategory::Action,
        sockets: &[FLOW_IN, SocketDescriptor::input("value", Number), FLOW_OUT],
        emit: actions::emit_set_variable,
        evaluate: None,
        defaults: &[("name", Literal::Text("score"))],
    },
    NodeDefinition {
        kind: NodeKind::StartTimer,
        name: "Start timer",
        category: NodeCategory::Action,
        sockets: &[FLOW_IN, FLOW_OUT],
        emit: actions::emit_start_timer,
        evaluate: None,
        defaults: &[("timer", Literal::Text("timer"))],
    },
    NodeDefinition {
        kind: NodeKind::StopTimer,
        name: "Stop timer",
        category: NodeCategory::Action,
        sockets: &[FLOW_IN, FLOW_OUT],
        emit: actions::emit_stop_timer,
        evaluate: None,
        defaults: &[("timer", Literal::Text("timer"))],
    },
    NodeDefinition {
        kind: NodeKind::ShowText,
        name: "Show text",
        category: NodeCategory::Action,
        sockets: &[
            FLOW_IN,
            SocketDescriptor::input("content", Str),
            SocketDescriptor::input("x", Number),
            SocketDescriptor::input("y", Number),
            FLOW_OUT,
        ],
        emit: actions::emit_show_text,
        evaluate: None,
        defaults: &[
            ("text", Literal::Text("label")),
            ("content", Literal::Text("")),
            ("size", Literal::Number(16.0)),
            ("color", Literal::Text("#ffffff")),
        ],
    },
    NodeDefinition {
        kind: NodeKind::HideText,
        name: "Hide text",
        category: NodeCategory::Action,
        sockets: &[FLOW_IN, FLOW_OUT],
        emit: actions::emit_hide_text,
        evaluate: None,
        defaults: &[("text", Literal::Text("label"))],
    },
    NodeDefinition {
        kind: NodeKind::EndGame,
        name: "End game",
        category: NodeCategory::Action,
        sockets: &[FLOW_IN],
        emit: actions::emit_end_game,
        evaluate: None,
        defaults: &[],
    },
];

/// Emitter for kinds that contribute no statements (pure data nodes).
fn emit_nothing(_id: NodeId, _node: &NodeInstance, _res: &mut Resolution<'_>) -> String {
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: &[NodeKind] = &[
        NodeKind::OnStart,
        NodeKind::OnUpdate,
        NodeKind::OnCollision,
        NodeKind::If,
        NodeKind::Compare,
        NodeKind::Not,
        NodeKind::Operator,
        NodeKind::Constant,
        NodeKind::Text,
        NodeKind::Input,
        NodeKind::Position,
        NodeKind::Variable,
        NodeKind::TimerElapsed,
        NodeKind::IsColliding,
        NodeKind::Move,
        NodeKind::Rotate,
        NodeKind::SetPosition,
        NodeKind::SetVelocity,
        NodeKind::ApplyForce,
        NodeKind::SetVariable,
        NodeKind::StartTimer,
        NodeKind::StopTimer,
        NodeKind::ShowText,
        NodeKind::HideText,
        NodeKind::EndGame,
    ];

    #[test]
    fn test_every_kind_registered() {
        let catalog = NodeCatalog::global();
        assert_eq!(catalog.len(), ALL_KINDS.len());
        for kind in ALL_KINDS {
            let def = catalog.get(kind.as_str()).expect("kind missing from table");
            assert_eq!(def.kind, *kind);
            assert_eq!(catalog.definition(*kind).kind, *kind);
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(*kind));
        }
        assert!(catalog.get("Teleport").is_none());
    }

    #[test]
    fn test_event_roots() {
        let catalog = NodeCatalog::global();
        let roots: Vec<_> = catalog
            .iter()
            .filter(|d| d.is_event_root())
            .map(|d| d.kind)
            .collect();
        assert_eq!(
            roots,
            vec![NodeKind::OnStart, NodeKind::OnUpdate, NodeKind::OnCollision]
        );
        for kind in roots {
            assert!(kind.event_hook().is_some());
        }
    }

    #[test]
    fn test_socket_names_unique_per_direction() {
        for def in NodeCatalog::global().iter() {
            for (i, a) in def.sockets.iter().enumerate() {
                for b in &def.sockets[i + 1..] {
                    assert!(
                        !(a.name == b.name && a.direction == b.direction),
                        "{} declares socket '{}' twice",
                        def.kind,
                        a.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_evaluators_only_on_data_producers() {
        for def in NodeCatalog::global().iter() {
            if def.evaluate.is_some() {
                assert!(def.outputs().all(|s| !s.ty.is_flow()), "{}", def.kind);
            }
        }
    }

    #[test]
    fn test_default_params() {
        let constant = NodeCatalog::global().definition(NodeKind::Constant);
        assert_eq!(constant.default_param("value"), Some(ParamValue::Number(10.0)));
        assert_eq!(constant.default_param("missing"), None);
    }
}
