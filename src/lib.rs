//! # nodescript-rs: Node Graph Game Scripting
//!
//! Compiles visual node graphs into Rhai game scripts and runs them in a
//! sandboxed, per-tick simulation.
//!
//! ## Architecture
//!
//! - **Catalog**: static registry of node kinds, their sockets and code emitters
//! - **Graph**: node instances and typed connections for one or more scenes
//! - **Compiler**: resolves flow and data connections and assembles the
//!   `init` / `update` / `on_collision` entry points
//! - **Sandbox**: Rhai engine on its own thread applying physics, collision
//!   detection and the compiled logic each tick
//! - **Host**: frame loop that owns the world snapshot between ticks
//! - **Communication**: crossbeam channels between host and sandbox
//!
//! ## Configuration
//!
//! Engine settings live in `config.toml` under the platform config directory
//! (`nodescript-rs`). See [`config`].
//!
//! ## Example
//!
//! ```ignore
//! use nodescript_rs::{
//!     compiler::CodeGenerator,
//!     config::EngineConfig,
//!     graph::Project,
//!     host::HostLoop,
//! };
//!
//! let project = Project::load("game.json")?;
//! let script = CodeGenerator::default().generate_project(&project);
//!
//! let config = EngineConfig::load_default_location();
//! let mut host = HostLoop::spawn(&config)?;
//! host.load(script.source)?;
//! host.init()?;
//! host.run_frames(600, config.host.frame_delta())?;
//! ```

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod host;
pub mod sandbox;
pub mod world;

// Re-export commonly used types
pub use catalog::{NodeCatalog, NodeKind};
pub use compiler::{CodeGenerator, GeneratedScript};
pub use config::EngineConfig;
pub use error::{NodeScriptError, Result};
pub use graph::{GraphModel, Project};
pub use host::{FrameOutcome, HostLoop};
pub use world::WorldSnapshot;
