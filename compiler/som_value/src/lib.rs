//! SOM Value - runtime values for the SOM interpreter core.
//!
//! This crate provides:
//! - `Value` and its payload types (`ScalarInt`, `Heap`, `Instance`, ...)
//! - `Activation`, the context chain that closures capture
//! - `Universe`, which maps values to classes and renders `describe`
//! - The evaluation error taxonomy (`EvalError`, `EvalErrorKind`)

mod activation;
mod errors;
mod universe;
mod value;

pub use activation::{Activation, AddressFault, Arguments};
pub use errors::{
    arity_mismatch, binary_type_mismatch, division_by_zero, immutable_value, invalid_address,
    invalid_shift, not_callable, stack_overflow, type_coercion, unsupported_state,
    BacktraceFrame, EvalBacktrace, EvalError, EvalErrorKind, EvalNote, EvalResult,
};
pub use universe::{Universe, CLASSLESS_DESCRIPTION};
pub use value::{BlockValue, Class, ClassRef, ForeignHandle, Heap, Instance, ScalarInt, Value};
