//! `InterpreterBuilder` for configuring an `Interpreter`.

use som_ir::ExprArena;
use som_value::Universe;

use super::Interpreter;
use crate::diagnostics::{CallStack, EvalCounters};
use crate::eval_mode::EvalMode;

/// Builder for `Interpreter`.
///
/// Defaults: a fresh `Universe`, `EvalMode::Interpret`, profiling off.
pub struct InterpreterBuilder<'a> {
    arena: &'a ExprArena,
    universe: Option<Universe>,
    mode: EvalMode,
    profile: bool,
}

impl<'a> InterpreterBuilder<'a> {
    pub fn new(arena: &'a ExprArena) -> Self {
        Self {
            arena,
            universe: None,
            mode: EvalMode::default(),
            profile: false,
        }
    }

    /// Set the evaluation mode, which controls the invocation depth limit.
    #[must_use]
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Use a pre-populated universe instead of a fresh one.
    #[must_use]
    pub fn universe(mut self, universe: Universe) -> Self {
        self.universe = Some(universe);
        self
    }

    /// Enable evaluation counters.
    #[must_use]
    pub fn profile(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    pub fn build(self) -> Interpreter<'a> {
        let call_stack = CallStack::new(self.mode.max_recursion_depth());
        Interpreter {
            arena: self.arena,
            universe: self.universe.unwrap_or_default(),
            mode: self.mode,
            call_stack,
            counters: self.profile.then(EvalCounters::default),
        }
    }
}
