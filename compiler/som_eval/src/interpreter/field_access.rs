//! Non-local field access.
//!
//! `FieldRead`/`FieldWrite` address a slot of the activation `context_level`
//! hops out. `InstanceFieldRead`/`InstanceFieldWrite` address a field of that
//! activation's receiver object. Writes evaluate their value expression
//! against the current activation first, coerce it, then walk the chain.
//! A write evaluates to the stored value.

use som_ir::{ExprId, ExprKind, Span};
use som_value::{
    immutable_value, type_coercion, Activation, AddressFault, EvalError, EvalResult, Instance,
    Value,
};

use super::Interpreter;

/// Check that an evaluation result can live in a slot.
///
/// Foreign handles are host-only and fail with a recoverable
/// `TypeCoercion`; every other value passes through unchanged.
pub fn coerce_to_runtime(value: Value) -> EvalResult {
    match value {
        Value::Foreign(handle) => Err(type_coercion(
            "foreign value",
            format!("host handle {} cannot be stored in a slot", handle.0),
        )),
        other => Ok(other),
    }
}

impl Interpreter<'_> {
    pub(super) fn eval_field_read(
        activation: &Activation,
        kind: ExprKind,
        field_index: u32,
        context_level: u32,
        span: Span,
    ) -> EvalResult {
        let target = Self::reach(activation, kind, context_level, field_index, span)?;
        target.read_slot(field_index).map_err(|fault| {
            Self::address_fault(kind, context_level, field_index, fault, activation, span)
        })
    }

    pub(super) fn eval_field_write(
        &mut self,
        activation: &Activation,
        kind: ExprKind,
        field_index: u32,
        context_level: u32,
        value: ExprId,
        span: Span,
    ) -> EvalResult {
        let value = self.evaluate(value, activation)?;
        let value = coerce_to_runtime(value).map_err(|e| e.with_span(span))?;
        let target = Self::reach(activation, kind, context_level, field_index, span)?;
        target
            .write_slot(field_index, value.clone())
            .map_err(|fault| {
                Self::address_fault(kind, context_level, field_index, fault, activation, span)
            })?;
        Ok(value)
    }

    pub(super) fn eval_instance_field_read(
        activation: &Activation,
        kind: ExprKind,
        field_index: u32,
        context_level: u32,
        span: Span,
    ) -> EvalResult {
        let object = Self::outer_instance(activation, kind, context_level, field_index, span)?;
        object.field(field_index).map_err(|fault| {
            Self::address_fault(kind, context_level, field_index, fault, activation, span)
        })
    }

    pub(super) fn eval_instance_field_write(
        &mut self,
        activation: &Activation,
        kind: ExprKind,
        field_index: u32,
        context_level: u32,
        value: ExprId,
        span: Span,
    ) -> EvalResult {
        let value = self.evaluate(value, activation)?;
        let value = coerce_to_runtime(value).map_err(|e| e.with_span(span))?;
        let object = Self::outer_instance(activation, kind, context_level, field_index, span)?;
        if object.is_value() {
            let class = object.class();
            let name = class.as_ref().map_or("Object", |c| c.name());
            return Err(immutable_value(name).with_span(span));
        }
        object
            .set_field(field_index, value.clone())
            .map_err(|fault| {
                Self::address_fault(kind, context_level, field_index, fault, activation, span)
            })?;
        Ok(value)
    }

    /// The receiver object of the activation `context_level` hops out.
    fn outer_instance(
        activation: &Activation,
        kind: ExprKind,
        context_level: u32,
        field_index: u32,
        span: Span,
    ) -> Result<Instance, EvalError> {
        let target = Self::reach(activation, kind, context_level, field_index, span)?;
        match target.receiver() {
            Value::Instance(object) => Ok(object.clone()),
            other => Err(Self::address_fault(
                kind,
                context_level,
                field_index,
                AddressFault::NotAnInstance {
                    type_name: other.type_name(),
                },
                activation,
                span,
            )),
        }
    }
}
