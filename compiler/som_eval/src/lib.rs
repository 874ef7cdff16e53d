//! SOM Eval - the evaluator of the SOM interpreter core.
//!
//! # Architecture
//!
//! - `Interpreter`: tree-walking evaluation of an `ExprArena` against an
//!   `Activation`, configured through `InterpreterBuilder`
//! - `evaluate_binary` and the per-operator functions: the numeric tower
//! - `CallStack`: invocation frames, depth limit and backtraces
//!
//! Value types, activations and errors come from `som_value` and are
//! re-exported here for convenience.

mod diagnostics;
mod eval_mode;
mod interpreter;
mod logging;
pub mod operators;
mod stack;

pub use diagnostics::{CallFrame, CallStack, EvalCounters};
pub use eval_mode::EvalMode;
pub use interpreter::{coerce_to_runtime, Interpreter, InterpreterBuilder};
pub use logging::init_tracing;
pub use operators::evaluate_binary;
pub use stack::ensure_sufficient_stack;

pub use som_value::{
    Activation, AddressFault, BlockValue, ClassRef, EvalError, EvalErrorKind, EvalResult,
    Instance, Universe, Value,
};

#[cfg(test)]
mod tests;
