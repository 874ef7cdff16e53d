//! Arena allocation for the flat expression tree.
//!
//! - Contiguous storage for all expressions of one compilation unit
//! - Child references use `ExprId` indices
//! - Child lists use `ExprRange` into `expr_lists`
//! - Non-`Copy` literals live in a separate constant pool

use std::fmt;

use crate::{ConstId, Constant, Expr, ExprId, ExprKind, ExprRange, Span};

/// Contiguous storage for expressions and constants.
#[derive(Clone, Default)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,
    /// Flattened expression lists (sequence bodies, invocation arguments).
    expr_lists: Vec<ExprId>,
    /// Constant pool (indexed by `ConstId`).
    constants: Vec<Constant>,
}

#[cold]
fn arena_full(what: &str) -> ! {
    panic!("expression arena overflow: too many {what}")
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression, return its ID.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = u32::try_from(self.exprs.len()).unwrap_or_else(|_| arena_full("expressions"));
        self.exprs.push(expr);
        ExprId::new(id)
    }

    /// Allocate an expression from a kind and span.
    #[inline]
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.alloc_expr(Expr::new(kind, span))
    }

    /// Allocate a constant, return its ID.
    pub fn alloc_const(&mut self, constant: Constant) -> ConstId {
        let id = u32::try_from(self.constants.len()).unwrap_or_else(|_| arena_full("constants"));
        self.constants.push(constant);
        ConstId::new(id)
    }

    /// Allocate a constant and the literal node referring to it.
    pub fn alloc_literal(&mut self, constant: Constant, span: Span) -> ExprId {
        let id = self.alloc_const(constant);
        self.alloc(ExprKind::Literal(id), span)
    }

    /// Allocate a list of expression IDs, return the range.
    pub fn alloc_expr_list(&mut self, ids: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start =
            u32::try_from(self.expr_lists.len()).unwrap_or_else(|_| arena_full("list entries"));
        self.expr_lists.extend(ids);
        let len = self.expr_lists.len() - start as usize;
        let len = u16::try_from(len).unwrap_or_else(|_| arena_full("list elements"));
        ExprRange::new(start, len)
    }

    /// Get an expression by ID.
    ///
    /// # Panics
    /// Panics if the ID does not belong to this arena.
    #[inline]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Get an expression by ID, or `None` if it is not in this arena.
    #[inline]
    pub fn try_get_expr(&self, id: ExprId) -> Option<&Expr> {
        self.exprs.get(id.index())
    }

    /// Get the expression IDs of a list.
    #[inline]
    pub fn get_expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    /// Get the expression IDs of a list, or `None` if the range runs past
    /// the list storage.
    #[inline]
    pub fn try_get_expr_list(&self, range: ExprRange) -> Option<&[ExprId]> {
        let start = range.start as usize;
        self.expr_lists.get(start..start + range.len())
    }

    /// Get a constant by ID.
    #[inline]
    pub fn get_const(&self, id: ConstId) -> &Constant {
        &self.constants[id.index()]
    }

    #[inline]
    pub fn try_get_const(&self, id: ConstId) -> Option<&Constant> {
        self.constants.get(id.index())
    }

    /// Number of expressions.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprArena")
            .field("exprs", &self.exprs.len())
            .field("expr_lists", &self.expr_lists.len())
            .field("constants", &self.constants.len())
            .finish()
    }
}
