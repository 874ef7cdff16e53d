//! Error types for evaluation.
//!
//! `EvalErrorKind` is the structured category; factory functions (e.g.
//! `division_by_zero()`) are the public way to build an `EvalError`.
//!
//! # Propagation policy
//!
//! Kinds split into two families:
//!
//! - **Recoverable** (`DivisionByZero`, `TypeCoercion`, ...): a user program
//!   can trigger them, and a `Guard` node may intercept them.
//! - **Internal faults** (`InvalidAddress`, `UnsupportedState`): the tree or
//!   object graph handed to the evaluator is malformed. These abort the
//!   whole evaluation, are never intercepted, and carry as much context as
//!   the evaluator can attach (span, node kind, context level, index).

use std::fmt;

use som_ir::{BinaryOp, Span};

use crate::activation::AddressFault;
use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Arithmetic
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: &'static str },
    #[error("shift amount {amount} out of range")]
    InvalidShift { amount: String },

    // Type
    #[error("cannot coerce {got} to a runtime value: {detail}")]
    TypeCoercion { got: &'static str, detail: String },
    #[error("operator `{op}` cannot be applied to {left} and {right}")]
    BinaryTypeMismatch {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("cannot modify field of value object {class_name}")]
    ImmutableValue { class_name: String },

    // Invocation
    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },
    #[error("block expects {expected} argument(s), got {got}")]
    ArityMismatch { expected: usize, got: usize },
    #[error("maximum call depth exceeded (limit: {depth})")]
    StackOverflow { depth: usize },

    // Internal faults
    #[error(
        "invalid address in {node} (context level {context_level}, index {index}): {fault}"
    )]
    InvalidAddress {
        node: &'static str,
        context_level: u32,
        index: u32,
        fault: AddressFault,
    },
    #[error("unsupported object state: {detail}")]
    UnsupportedState { detail: String },
}

impl EvalErrorKind {
    /// Whether a user program may intercept this error.
    pub fn is_recoverable(&self) -> bool {
        !self.is_internal_fault()
    }

    /// Whether this error indicates a malformed tree or object graph.
    pub fn is_internal_fault(&self) -> bool {
        matches!(
            self,
            EvalErrorKind::InvalidAddress { .. } | EvalErrorKind::UnsupportedState { .. }
        )
    }
}

/// Additional context note attached to an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNote {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalNote {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Method name, or `[] in <method>` for blocks.
    pub name: String,
    /// Span of the invoking node.
    pub span: Option<Span>,
}

/// Snapshot of the invocation stack at the error site, most recent first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "stack backtrace:")?;
        for (i, frame) in self.frames.iter().enumerate() {
            write!(f, "  {i}: {}", frame.name)?;
            if let Some(span) = frame.span {
                write!(f, " at {span}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Evaluation error.
#[derive(Clone, Debug)]
pub struct EvalError {
    /// Structured error category.
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()`.
    pub message: String,
    /// Span of the node that raised the error, if known.
    pub span: Option<Span>,
    /// Invocation stack at the error site.
    pub backtrace: Option<EvalBacktrace>,
    /// Secondary context (node details, call sites).
    pub notes: Vec<EvalNote>,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            span: None,
            backtrace: None,
            notes: Vec::new(),
        }
    }

    /// Attach a span unless one is already set (innermost span wins).
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: EvalNote) -> Self {
        self.notes.push(note);
        self
    }

    /// Attach a backtrace unless one is already set (deepest capture wins).
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        if self.backtrace.is_none() {
            self.backtrace = Some(backtrace);
        }
        self
    }

    #[inline]
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    #[inline]
    pub fn is_internal_fault(&self) -> bool {
        self.kind.is_internal_fault()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(span) = self.span {
            write!(f, " at {span}")?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note.message)?;
        }
        if let Some(backtrace) = &self.backtrace {
            write!(f, "\n{backtrace}")?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        EvalError::from_kind(kind)
    }
}

// Arithmetic

/// Integer division, modulo or remainder with a zero divisor.
#[cold]
pub fn division_by_zero(op: BinaryOp) -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero {
        operation: op.operation_name(),
    })
}

#[cold]
pub fn invalid_shift(amount: impl fmt::Display) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidShift {
        amount: amount.to_string(),
    })
}

// Type

#[cold]
pub fn type_coercion(got: &'static str, detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeCoercion {
        got,
        detail: detail.into(),
    })
}

#[cold]
pub fn binary_type_mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BinaryTypeMismatch {
        op,
        left: left.type_name(),
        right: right.type_name(),
    })
}

#[cold]
pub fn immutable_value(class_name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ImmutableValue {
        class_name: class_name.to_string(),
    })
}

// Invocation

#[cold]
pub fn not_callable(value: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: value.type_name(),
    })
}

#[cold]
pub fn arity_mismatch(expected: usize, got: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch { expected, got })
}

#[cold]
pub fn stack_overflow(depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth })
}

// Internal faults

#[cold]
pub fn invalid_address(
    node: &'static str,
    context_level: u32,
    index: u32,
    fault: AddressFault,
) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidAddress {
        node,
        context_level,
        index,
        fault,
    })
}

#[cold]
pub fn unsupported_state(detail: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedState {
        detail: detail.into(),
    })
}
