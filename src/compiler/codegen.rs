//! Assembles per-node output into a script with three entry points.
//!
//! For every event root in every scene the generator emits one function
//! named `on_<event>_<scene>_<id>`, then writes:
//!
//! ```text
//! fn init()                      -> calls every on_start_* function
//! fn update(delta)               -> calls every on_update_* function
//! fn on_collision(subject, other) -> calls every on_collision_* function
//! ```
//!
//! The sandbox binds the world snapshot as `this` when it calls an entry
//! point; the entry points forward `this` by calling the event functions in
//! method style.

use crate::catalog::{EventHook, NodeCatalog};
use crate::compiler::format;
use crate::compiler::resolver::{ConnectionResolver, ResolveStats};
use crate::graph::{GraphModel, NodeId, Project, SceneId};
use std::fmt;

/// Name of the generated function for an event node.
pub fn event_function_name(hook: EventHook, scene: &SceneId, node: NodeId) -> String {
    format!("on_{}_{}_{}", hook.prefix(), scene.ident(), node)
}

/// Diagnostics collected during generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub start_functions: usize,
    pub update_functions: usize,
    pub collision_functions: usize,
    pub unknown_kinds: usize,
    pub truncated_flow: usize,
    pub data_cycles: usize,
    /// Whether the formatting pass was applied.
    pub formatted: bool,
}

impl GenerationStats {
    fn absorb(&mut self, stats: ResolveStats) {
        self.unknown_kinds += stats.unknown_kinds;
        self.truncated_flow += stats.truncated_flow;
        self.data_cycles += stats.data_cycles;
    }

    pub fn event_functions(&self) -> usize {
        self.start_functions + self.update_functions + self.collision_functions
    }
}

/// Output of the code generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedScript {
    pub source: String,
    pub stats: GenerationStats,
}

impl fmt::Display for GeneratedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compiles scene graphs into a single script.
pub struct CodeGenerator<'c> {
    catalog: &'c NodeCatalog,
    format: bool,
}

impl Default for CodeGenerator<'static> {
    fn default() -> Self {
        Self::new(NodeCatalog::global())
    }
}

impl<'c> CodeGenerator<'c> {
    pub fn new(catalog: &'c NodeCatalog) -> Self {
        Self {
            catalog,
            format: true,
        }
    }

    /// Skip the re-indentation pass.
    pub fn without_formatting(mut self) -> Self {
        self.format = false;
        self
    }

    pub fn generate_project(&self, project: &Project) -> GeneratedScript {
        self.generate(project.scenes.iter())
    }

    /// Generate a script from one or more scenes. Scenes are processed in
    /// the given order and nodes in id order within each scene.
    pub fn generate<'g, I>(&self, scenes: I) -> GeneratedScript
    where
        I: IntoIterator<Item = (&'g SceneId, &'g GraphModel)>,
    {
        let mut stats = GenerationStats::default();
        let mut functions = String::new();
        let mut init_calls = String::new();
        let mut update_calls = String::new();
        let mut collision_calls = String::new();

        for (scene, graph) in scenes {
            let resolver = ConnectionResolver::new(graph, self.catalog, scene);
            for (id, node) in &graph.nodes {
                let Some(def) = self.catalog.get(&node.kind) else {
                    continue;
                };
                if !def.is_event_root() {
                    continue;
                }
                let Some(hook) = def.kind.event_hook() else {
                    continue;
                };

                let (code, resolved) = resolver.emit_root(*id);
                stats.absorb(resolved);
                functions.push_str(&code);
                functions.push('\n');

                let name = event_function_name(hook, scene, *id);
                let call = format!("this.{}({});\n", name, hook.parameters());
                match hook {
                    EventHook::Start => {
                        stats.start_functions += 1;
                        init_calls.push_str(&call);
                    }
                    EventHook::Update => {
                        stats.update_functions += 1;
                        update_calls.push_str(&call);
                    }
                    EventHook::Collision => {
                        stats.collision_functions += 1;
                        collision_calls.push_str(&call);
                    }
                }
            }
        }

        let mut source = String::from("// Generated by nodescript. Do not edit.\n\n");
        source.push_str(&functions);
        source.push_str(&format!("fn init() {{\n{}}}\n\n", init_calls));
        source.push_str(&format!("fn update(delta) {{\n{}}}\n\n", update_calls));
        source.push_str(&format!(
            "fn on_collision(subject, other) {{\n{}}}\n",
            collision_calls
        ));

        if self.format {
            match format::reindent(&source) {
                Some(formatted) => {
                    source = formatted;
                    stats.formatted = true;
                }
                None => tracing::warn!("Generated source has unbalanced braces; left unformatted"),
            }
        }

        tracing::debug!(
            events = stats.event_functions(),
            unknown = stats.unknown_kinds,
            truncated = stats.truncated_flow,
            bytes = source.len(),
            "script generated"
        );

        GeneratedScript { source, stats }
    }
}
