//! Invocation tracking for the evaluator.
//!
//! - `CallStack` records one `CallFrame` per method or block invocation,
//!   enforces the mode's depth limit, and snapshots itself into an
//!   `EvalBacktrace` when an error escapes an invocation.
//! - `EvalCounters` are optional profiling counters; when disabled every
//!   increment is a no-op.

use std::rc::Rc;

use som_ir::Span;
use som_value::{stack_overflow, BacktraceFrame, EvalBacktrace, EvalError};

/// One live invocation.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Method name, or `[] in <method>` for a block.
    pub name: Rc<str>,
    /// Span of the node that performed the invocation.
    pub call_span: Option<Span>,
}

/// Live invocation stack.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` of `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, failing with `StackOverflow` at the depth limit.
    /// The frame is not pushed on failure.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(stack_overflow(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Name of the innermost frame, if any.
    pub fn current_name(&self) -> Option<&Rc<str>> {
        self.frames.last().map(|f| &f.name)
    }

    /// Snapshot the stack, most recent invocation first.
    pub fn capture(&self) -> EvalBacktrace {
        let frames = self
            .frames
            .iter()
            .rev()
            .map(|f| BacktraceFrame {
                name: f.name.to_string(),
                span: f.call_span,
            })
            .collect();
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace unless the stack is empty or the error has one.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Optional profiling counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalCounters {
    pub expressions_evaluated: u64,
    pub method_invocations: u64,
    pub block_invocations: u64,
    pub errors_intercepted: u64,
}

impl EvalCounters {
    pub fn report(&self) -> String {
        format!(
            "Evaluation profile:\n  \
             expressions evaluated: {}\n  \
             method invocations:    {}\n  \
             block invocations:     {}\n  \
             errors intercepted:    {}",
            self.expressions_evaluated,
            self.method_invocations,
            self.block_invocations,
            self.errors_intercepted,
        )
    }
}
