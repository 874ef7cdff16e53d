//! SOM IR - Expression IR for the SOM interpreter core.
//!
//! The tree is built by a collaborator (parser, bytecode-to-AST translator,
//! test harness) and handed to `som_eval` as plain data. Every addressing
//! decision (context levels, field and argument indices) is made here at
//! construction time, never during evaluation.

mod arena;
mod ast;
mod expr_id;
mod operators;
mod span;

pub use arena::ExprArena;
pub use ast::{Constant, Expr, ExprKind, Method};
pub use expr_id::{ConstId, ExprId, ExprRange};
pub use operators::BinaryOp;
pub use span::Span;
