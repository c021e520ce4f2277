//! Rhai engine setup for generated game scripts.
//!
//! Scripts see the Rhai standard library plus a small native surface:
//!
//! - `end_game()` - request termination after the current call
//! - `lerp(a, b, t)` - linear interpolation
//! - `clamp(x, min, max)` - clamp a float
//!
//! `eval` is disabled. `print` and `debug` go to `tracing` under the
//! `script` target.
//!
//! Graph numbers are a single numeric type, so integer `+ - * / % **`
//! are overloaded: an exact integer result stays an integer, anything
//! else (fractions, negative powers, overflow) becomes a float.

use crate::config::SandboxLimits;
use crate::sandbox::SandboxError;
use rhai::{
    CallFnOptions, Dynamic, Engine, EvalAltResult, FuncArgs, Position, Scope, AST, FLOAT, INT,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Entry points a compiled script may define.
pub const INIT_FN: &str = "init";
pub const UPDATE_FN: &str = "update";
pub const COLLISION_FN: &str = "on_collision";

/// A compiled script and which entry points it defines.
#[derive(Debug, Clone)]
pub struct GameScript {
    ast: AST,
    has_init: bool,
    has_update: bool,
    has_on_collision: bool,
}

impl GameScript {
    fn new(ast: AST) -> Self {
        let defines = |name: &str, arity: usize| {
            ast.iter_functions()
                .any(|f| f.name == name && f.params.len() == arity)
        };
        let has_init = defines(INIT_FN, 0);
        let has_update = defines(UPDATE_FN, 1);
        let has_on_collision = defines(COLLISION_FN, 2);
        Self {
            ast,
            has_init,
            has_update,
            has_on_collision,
        }
    }

    pub fn has_init(&self) -> bool {
        self.has_init
    }

    pub fn has_update(&self) -> bool {
        self.has_update
    }

    pub fn has_on_collision(&self) -> bool {
        self.has_on_collision
    }
}

/// The sandbox's Rhai engine and its termination flag.
pub struct ScriptRuntime {
    engine: Engine,
    end_requested: Arc<AtomicBool>,
}

impl ScriptRuntime {
    pub fn new(limits: &SandboxLimits) -> Self {
        let end_requested = Arc::new(AtomicBool::new(false));
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine, limits, end_requested.clone());
        Self {
            engine,
            end_requested,
        }
    }

    fn configure_engine(engine: &mut Engine, limits: &SandboxLimits, end: Arc<AtomicBool>) {
        // Safety limits
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_operations(limits.max_operations);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);

        engine.disable_symbol("eval");

        engine.on_print(|text| tracing::info!(target: "script", "{}", text));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "script", source = source.unwrap_or(""), %pos, "{}", text)
        });

        Self::register_numeric_operators(engine);

        engine.register_fn("end_game", move || end.store(true, Ordering::SeqCst));

        engine.register_fn("lerp", |a: f64, b: f64, t: f64| a + (b - a) * t);
        engine.register_fn("clamp", |x: f64, min: f64, max: f64| {
            if min <= max {
                x.clamp(min, max)
            } else {
                x
            }
        });
    }

    fn register_numeric_operators(engine: &mut Engine) {
        // Built-in operators skip overloads unless fast operators are off
        engine.set_fast_operators(false);

        engine.register_fn("+", |a: INT, b: INT| {
            int_or_float(a.checked_add(b), a as FLOAT + b as FLOAT)
        });
        engine.register_fn("-", |a: INT, b: INT| {
            int_or_float(a.checked_sub(b), a as FLOAT - b as FLOAT)
        });
        engine.register_fn("*", |a: INT, b: INT| {
            int_or_float(a.checked_mul(b), a as FLOAT * b as FLOAT)
        });
        engine.register_fn("/", |a: INT, b: INT| {
            let exact = a.checked_rem(b).filter(|r| *r == 0).and_then(|_| a.checked_div(b));
            int_or_float(exact, a as FLOAT / b as FLOAT)
        });
        engine.register_fn("%", |a: INT, b: INT| {
            int_or_float(a.checked_rem(b), a as FLOAT % b as FLOAT)
        });
        engine.register_fn("**", |a: INT, b: INT| {
            let exact = u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp));
            int_or_float(exact, (a as FLOAT).powf(b as FLOAT))
        });
    }

    /// Compile a script and run its top-level statements once.
    pub fn load(&self, source: &str) -> Result<GameScript, SandboxError> {
        let ast = self.engine.compile(source).map_err(|err| SandboxError::Load {
            message: err.0.to_string(),
            line: err.1.line(),
            column: err.1.position(),
        })?;

        self.engine.run_ast(&ast).map_err(|err| {
            let (line, column) = innermost_position(&err);
            SandboxError::Load {
                message: err.to_string(),
                line,
                column,
            }
        })?;

        Ok(GameScript::new(ast))
    }

    /// Call a script function with `this` bound to `world`. Mutations made
    /// before an error are kept.
    pub fn call(
        &self,
        script: &GameScript,
        world: &mut Dynamic,
        name: &str,
        args: impl FuncArgs,
    ) -> Result<(), Box<EvalAltResult>> {
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(world);
        let mut scope = Scope::new();
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut scope, &script.ast, name, args)
            .map(|_| ())
    }

    pub fn end_requested(&self) -> bool {
        self.end_requested.load(Ordering::SeqCst)
    }

    pub fn clear_end_request(&self) {
        self.end_requested.store(false, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("end_requested", &self.end_requested())
            .finish()
    }
}

fn int_or_float(exact: Option<INT>, approx: FLOAT) -> Dynamic {
    exact.map_or_else(|| Dynamic::from(approx), Dynamic::from)
}

/// Line and column of the innermost failing expression. Errors raised
/// inside a function call are wrapped once per call level.
pub fn innermost_position(err: &EvalAltResult) -> (Option<usize>, Option<usize>) {
    let mut current = err;
    while let EvalAltResult::ErrorInFunctionCall(_, _, inner, _) = current {
        current = inner.as_ref();
    }
    position_of(current.position())
}

fn position_of(pos: Position) -> (Option<usize>, Option<usize>) {
    (pos.line(), pos.position())
}
