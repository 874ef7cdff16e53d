//! Method and block invocation.

use std::rc::Rc;

use som_ir::{ExprId, ExprRange, Method, Span};
use som_value::{
    arity_mismatch, not_callable, Activation, Arguments, BlockValue, EvalResult, Value,
};

use super::Interpreter;
use crate::diagnostics::CallFrame;

impl Interpreter<'_> {
    /// Invoke `method` with `receiver` and `arguments` in a fresh activation
    /// that has no enclosing activation.
    #[tracing::instrument(level = "debug", skip_all, fields(method = %method.name))]
    pub fn invoke(
        &mut self,
        method: &Method,
        receiver: Value,
        arguments: impl IntoIterator<Item = Value>,
    ) -> EvalResult {
        let arguments: Arguments = arguments.into_iter().collect();
        if arguments.len() != method.num_args as usize {
            return Err(arity_mismatch(method.num_args as usize, arguments.len()));
        }
        if let Some(counters) = &mut self.counters {
            counters.method_invocations = counters.method_invocations.wrapping_add(1);
        }

        let activation = Activation::root(receiver, arguments, method.num_slots as usize);
        let frame = CallFrame {
            name: Rc::from(&*method.name),
            call_span: None,
        };
        self.with_frame(frame, |this| this.evaluate(method.body, &activation))
    }

    /// Invoke a closure. The new activation's enclosing link is the
    /// activation captured when the block literal was evaluated, not the
    /// caller's.
    pub fn invoke_block(
        &mut self,
        block: &BlockValue,
        arguments: impl IntoIterator<Item = Value>,
        call_span: Option<Span>,
    ) -> EvalResult {
        let arguments: Arguments = arguments.into_iter().collect();
        if arguments.len() != block.num_args() as usize {
            let err = arity_mismatch(block.num_args() as usize, arguments.len());
            return Err(match call_span {
                Some(span) => err.with_span(span),
                None => err,
            });
        }
        if let Some(counters) = &mut self.counters {
            counters.block_invocations = counters.block_invocations.wrapping_add(1);
        }

        let name: Rc<str> = match self.call_stack.current_name() {
            Some(caller) => Rc::from(format!("[] in {caller}")),
            None => Rc::from("[]"),
        };
        tracing::debug!(block = %name, args = arguments.len(), "invoking block");

        let inner = Activation::nested(
            block.outer(),
            Value::Block(block.clone()),
            arguments,
            block.num_slots() as usize,
        );
        let frame = CallFrame { name, call_span };
        self.with_frame(frame, |this| this.evaluate(block.body(), &inner))
    }

    pub(super) fn eval_block_invoke(
        &mut self,
        activation: &Activation,
        block: ExprId,
        args: ExprRange,
        span: Span,
    ) -> EvalResult {
        let callee = self.evaluate(block, activation)?;
        let mut arguments = Arguments::new();
        for &arg in self.expr_list(args, span)? {
            arguments.push(self.evaluate(arg, activation)?);
        }
        match callee {
            Value::Block(block) => self.invoke_block(&block, arguments, Some(span)),
            other => Err(not_callable(&other).with_span(span)),
        }
    }

    /// Run `f` inside a pushed call frame. Errors leaving the frame carry a
    /// backtrace captured while the frame was still live.
    fn with_frame(
        &mut self,
        frame: CallFrame,
        f: impl FnOnce(&mut Self) -> EvalResult,
    ) -> EvalResult {
        let call_span = frame.call_span;
        if let Err(err) = self.call_stack.push(frame) {
            let err = match call_span {
                Some(span) => err.with_span(span),
                None => err,
            };
            return Err(self.call_stack.attach_backtrace(err));
        }
        let result = f(self).map_err(|err| self.call_stack.attach_backtrace(err));
        self.call_stack.pop();
        result
    }
}
