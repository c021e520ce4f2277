//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod worlds;

use nodescript_rs::compiler::CodeGenerator;
use nodescript_rs::config::SandboxLimits;
use nodescript_rs::graph::Project;
use nodescript_rs::sandbox::SandboxExecutor;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Compile a project with the global catalog
pub fn compile(project: &Project) -> String {
    CodeGenerator::default().generate_project(project).source
}

/// An executor with `source` already loaded
pub fn loaded_executor(source: &str) -> SandboxExecutor {
    let mut executor = SandboxExecutor::new(&SandboxLimits::default());
    if let Err(err) = executor.load(source) {
        panic!("script failed to load: {}\n{}", err, source);
    }
    executor
}
