//! Tree-walking evaluator.
//!
//! # Borrow pattern
//!
//! `Expr` is `Copy`, so each step copies the node out of the arena before
//! dispatching. The arena is held as `&'a ExprArena`, separate from the
//! mutable interpreter state, so child evaluation can recurse freely.
//!
//! # Activations
//!
//! The interpreter never owns an activation. Every evaluation call borrows
//! the currently executing one; nodes that touch enclosing state walk its
//! context chain by the hop count recorded in the node.

mod builder;
mod field_access;
mod invocation;

use som_ir::{Constant, ExprArena, ExprId, ExprKind, ExprRange, Span};
use som_value::{
    invalid_address, unsupported_state, Activation, AddressFault, BlockValue, ClassRef, EvalError,
    EvalNote, EvalResult, ForeignHandle, Universe, Value,
};

pub use builder::InterpreterBuilder;
pub use field_access::coerce_to_runtime;

use crate::diagnostics::{CallStack, EvalCounters};
use crate::eval_mode::EvalMode;
use crate::operators::evaluate_binary;
use crate::stack::ensure_sufficient_stack;

/// Evaluates expression trees from one arena.
pub struct Interpreter<'a> {
    arena: &'a ExprArena,
    universe: Universe,
    mode: EvalMode,
    call_stack: CallStack,
    counters: Option<EvalCounters>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter with a fresh universe in `Interpret` mode.
    pub fn new(arena: &'a ExprArena) -> Self {
        InterpreterBuilder::new(arena).build()
    }

    pub fn builder(arena: &'a ExprArena) -> InterpreterBuilder<'a> {
        InterpreterBuilder::new(arena)
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn universe_mut(&mut self) -> &mut Universe {
        &mut self.universe
    }

    /// Number of method and block invocations currently active.
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    pub fn counters(&self) -> Option<&EvalCounters> {
        self.counters.as_ref()
    }

    pub fn counters_report(&self) -> Option<String> {
        self.counters.as_ref().map(EvalCounters::report)
    }

    /// The class of `value`; see [`Universe::class_of`].
    pub fn class_of(&self, value: &Value) -> Result<ClassRef, EvalError> {
        self.universe.class_of(value)
    }

    /// Diagnostic text for `value`; see [`Universe::describe`].
    pub fn describe(&self, value: &Value) -> String {
        self.universe.describe(value)
    }

    /// Evaluate `expr_id` against `activation`.
    #[tracing::instrument(level = "trace", skip(self, activation))]
    pub fn evaluate(&mut self, expr_id: ExprId, activation: &Activation) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(expr_id, activation))
    }

    fn eval_inner(&mut self, expr_id: ExprId, activation: &Activation) -> EvalResult {
        if let Some(counters) = &mut self.counters {
            counters.expressions_evaluated = counters.expressions_evaluated.wrapping_add(1);
        }

        let arena = self.arena;
        let Some(&expr) = arena.try_get_expr(expr_id) else {
            return Err(Self::internal_fault(unsupported_state(format!(
                "expression {expr_id:?} is not in the arena"
            ))));
        };
        let span = expr.span;

        match expr.kind {
            ExprKind::Literal(id) => match arena.try_get_const(id) {
                Some(constant) => Ok(materialize(constant)),
                None => Err(Self::internal_fault(
                    unsupported_state(format!("constant {id:?} is not in the arena"))
                        .with_span(span),
                )),
            },

            ExprKind::Sequence(range) => {
                let mut last = Value::Nil;
                for &id in self.expr_list(range, span)? {
                    last = self.evaluate(id, activation)?;
                }
                Ok(last)
            }

            ExprKind::SelfRead { context_level } => {
                let target = Self::reach(activation, expr.kind, context_level, 0, span)?;
                Ok(target.receiver().clone())
            }

            ExprKind::ArgumentRead {
                index,
                context_level,
            } => {
                let target = Self::reach(activation, expr.kind, context_level, index, span)?;
                target.argument(index).map_err(|fault| {
                    Self::address_fault(expr.kind, context_level, index, fault, activation, span)
                })
            }

            ExprKind::FieldRead {
                field_index,
                context_level,
            } => Self::eval_field_read(activation, expr.kind, field_index, context_level, span),

            ExprKind::FieldWrite {
                field_index,
                context_level,
                value,
            } => self.eval_field_write(
                activation,
                expr.kind,
                field_index,
                context_level,
                value,
                span,
            ),

            ExprKind::InstanceFieldRead {
                field_index,
                context_level,
            } => Self::eval_instance_field_read(
                activation,
                expr.kind,
                field_index,
                context_level,
                span,
            ),

            ExprKind::InstanceFieldWrite {
                field_index,
                context_level,
                value,
            } => self.eval_instance_field_write(
                activation,
                expr.kind,
                field_index,
                context_level,
                value,
                span,
            ),

            ExprKind::Binary { op, left, right } => {
                let left = self.evaluate(left, activation)?;
                let right = self.evaluate(right, activation)?;
                evaluate_binary(&left, &right, op).map_err(|e| e.with_span(span))
            }

            ExprKind::Block {
                body,
                num_args,
                num_slots,
            } => Ok(Value::Block(BlockValue::new(
                body,
                num_args,
                num_slots,
                activation.clone(),
            ))),

            ExprKind::BlockInvoke { block, args } => {
                self.eval_block_invoke(activation, block, args, span)
            }

            ExprKind::Guard {
                body,
                handler,
                error_slot,
            } => self.eval_guard(activation, expr.kind, body, handler, error_slot, span),
        }
    }

    /// Language-level catch. Internal faults are never intercepted.
    fn eval_guard(
        &mut self,
        activation: &Activation,
        kind: ExprKind,
        body: ExprId,
        handler: ExprId,
        error_slot: u32,
        span: Span,
    ) -> EvalResult {
        match self.evaluate(body, activation) {
            Err(err) if err.is_recoverable() => {
                tracing::debug!(error = %err.message, "guard intercepted error");
                if let Some(counters) = &mut self.counters {
                    counters.errors_intercepted = counters.errors_intercepted.wrapping_add(1);
                }
                activation
                    .write_slot(error_slot, Value::string(&err.message))
                    .map_err(|fault| {
                        Self::address_fault(kind, 0, error_slot, fault, activation, span)
                    })?;
                self.evaluate(handler, activation)
            }
            result => result,
        }
    }

    /// Child list of a node; a range outside the arena is an internal fault.
    fn expr_list(&self, range: ExprRange, span: Span) -> Result<&'a [ExprId], EvalError> {
        let arena = self.arena;
        arena.try_get_expr_list(range).ok_or_else(|| {
            Self::internal_fault(
                unsupported_state(format!("expression list {range:?} is not in the arena"))
                    .with_span(span),
            )
        })
    }

    /// Follow `context_level` enclosing links from `activation`.
    fn reach<'act>(
        activation: &'act Activation,
        kind: ExprKind,
        context_level: u32,
        index: u32,
        span: Span,
    ) -> Result<&'act Activation, EvalError> {
        activation
            .at_context_level(context_level)
            .map_err(|fault| Self::address_fault(kind, context_level, index, fault, activation, span))
    }

    /// Build the internal fault for an address that did not resolve.
    #[cold]
    fn address_fault(
        kind: ExprKind,
        context_level: u32,
        index: u32,
        fault: AddressFault,
        activation: &Activation,
        span: Span,
    ) -> EvalError {
        let err = invalid_address(kind.name(), context_level, index, fault)
            .with_span(span)
            .with_note(EvalNote::with_span(
                format!(
                    "executing activation has {} enclosing level(s), {} slot(s), {} argument(s)",
                    activation.chain_len() - 1,
                    activation.num_slots(),
                    activation.num_arguments(),
                ),
                span,
            ));
        Self::internal_fault(err)
    }

    #[cold]
    fn internal_fault(err: EvalError) -> EvalError {
        tracing::warn!(error = %err.message, span = ?err.span, "internal evaluation fault");
        err
    }
}

impl std::fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("mode", &self.mode)
            .field("call_depth", &self.call_stack.depth())
            .field("exprs", &self.arena.expr_count())
            .finish_non_exhaustive()
    }
}

/// Turn a constant-pool entry into a value.
fn materialize(constant: &Constant) -> Value {
    match constant {
        Constant::Nil => Value::Nil,
        Constant::True => Value::Bool(true),
        Constant::False => Value::Bool(false),
        Constant::Integer(n) => Value::int(*n),
        Constant::BigInteger(n) => Value::big_integer(n.clone()),
        Constant::Double(d) => Value::Double(*d),
        Constant::String(s) => Value::string(s),
        Constant::Symbol(s) => Value::symbol(s),
        Constant::Foreign(handle) => Value::Foreign(ForeignHandle(*handle)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
