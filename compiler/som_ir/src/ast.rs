//! Expression nodes.
//!
//! Children are `ExprId` indices into the owning `ExprArena`, never boxes.
//! Every node that touches enclosing state carries its `context_level`
//! (number of enclosing-activation hops) pre-computed by whoever built the
//! tree. The evaluator never resolves names.

use std::fmt;

use num_bigint::BigInt;

use crate::{BinaryOp, ConstId, ExprId, ExprRange, Span};

/// Expression node.
#[derive(Copy, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Expression variants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Constant from the arena's pool.
    Literal(ConstId),

    /// Evaluate each child in order; the value is the last child's (nil if empty).
    Sequence(ExprRange),

    /// The receiver of the activation `context_level` hops out.
    SelfRead { context_level: u32 },

    /// Argument `index` of the activation `context_level` hops out.
    ArgumentRead { index: u32, context_level: u32 },

    /// Field slot `field_index` of the activation `context_level` hops out.
    FieldRead { field_index: u32, context_level: u32 },

    /// Store into field slot `field_index` of the activation `context_level`
    /// hops out. `value` is evaluated against the current activation.
    FieldWrite {
        field_index: u32,
        context_level: u32,
        value: ExprId,
    },

    /// Field `field_index` of the receiver object of the activation
    /// `context_level` hops out.
    InstanceFieldRead { field_index: u32, context_level: u32 },

    /// Store into field `field_index` of the receiver object of the
    /// activation `context_level` hops out.
    InstanceFieldWrite {
        field_index: u32,
        context_level: u32,
        value: ExprId,
    },

    /// Binary primitive; `left` is evaluated before `right`.
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },

    /// Block literal. Evaluates to a closure over the current activation.
    Block {
        body: ExprId,
        num_args: u32,
        num_slots: u32,
    },

    /// Invoke a block value with the given arguments.
    BlockInvoke { block: ExprId, args: ExprRange },

    /// Evaluate `body`; if it fails with a recoverable error, store the
    /// error message in slot `error_slot` of the current activation and
    /// evaluate `handler` instead.
    Guard {
        body: ExprId,
        handler: ExprId,
        error_slot: u32,
    },
}

impl ExprKind {
    /// Node kind name for diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "Literal",
            ExprKind::Sequence(_) => "Sequence",
            ExprKind::SelfRead { .. } => "SelfRead",
            ExprKind::ArgumentRead { .. } => "ArgumentRead",
            ExprKind::FieldRead { .. } => "FieldRead",
            ExprKind::FieldWrite { .. } => "FieldWrite",
            ExprKind::InstanceFieldRead { .. } => "InstanceFieldRead",
            ExprKind::InstanceFieldWrite { .. } => "InstanceFieldWrite",
            ExprKind::Binary { .. } => "Binary",
            ExprKind::Block { .. } => "Block",
            ExprKind::BlockInvoke { .. } => "BlockInvoke",
            ExprKind::Guard { .. } => "Guard",
        }
    }
}

/// Literal payloads that do not fit a `Copy` node.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Nil,
    True,
    False,
    Integer(i64),
    /// Arbitrary-precision literal. Demoted on materialization when it fits 64 bits.
    BigInteger(BigInt),
    Double(f64),
    String(Box<str>),
    Symbol(Box<str>),
    /// Opaque host handle. Not a runtime value: storing it into a slot fails.
    Foreign(u64),
}

/// An invocable body: a method or the top-level body handed to the evaluator.
#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    pub name: Box<str>,
    pub body: ExprId,
    pub num_args: u32,
    pub num_slots: u32,
}

impl Method {
    pub fn new(name: impl Into<Box<str>>, body: ExprId, num_args: u32, num_slots: u32) -> Self {
        Method {
            name: name.into(),
            body,
            num_args,
            num_slots,
        }
    }
}
