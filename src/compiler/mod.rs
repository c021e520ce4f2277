//! Graph-to-script compilation.
//!
//! - [`resolver`] follows flow connections and resolves data expressions
//! - [`codegen`] walks event roots and assembles the entry points
//! - [`format`] re-indents the assembled source

pub mod codegen;
pub mod format;
pub mod resolver;

pub use codegen::{event_function_name, CodeGenerator, GeneratedScript, GenerationStats};
pub use resolver::{ConnectionResolver, Resolution, ResolveStats};
