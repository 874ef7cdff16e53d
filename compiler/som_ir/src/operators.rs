//! Binary operators of the numeric tower.
//!
//! Each variant corresponds to one arithmetic or comparison primitive of
//! the Integer/Double protocol. The selector text is what the primitive is
//! installed under, and is what diagnostics print.

use std::fmt;

/// Binary primitive operator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    /// Integer division (`/`), truncating toward zero.
    Div,
    /// Float division (`//`), always produces a double.
    DoubleDiv,
    /// Floored modulo (`%`), result takes the sign of the divisor.
    Mod,
    /// Truncated remainder (`rem:`), result takes the sign of the dividend.
    Rem,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Bitwise
    BitAnd,
    BitXor,
    Shl,
}

impl BinaryOp {
    /// Returns the selector this primitive is installed under.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::DoubleDiv => "//",
            Self::Mod => "%",
            Self::Rem => "rem:",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::BitAnd => "&",
            Self::BitXor => "bitXor:",
            Self::Shl => "<<",
        }
    }

    /// Human-readable operation name used in overflow and zero-divisor messages.
    pub const fn operation_name(self) -> &'static str {
        match self {
            Self::Add => "addition",
            Self::Sub => "subtraction",
            Self::Mul => "multiplication",
            Self::Div => "division",
            Self::DoubleDiv => "float division",
            Self::Mod => "modulo",
            Self::Rem => "remainder",
            Self::Eq | Self::NotEq => "equality",
            Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => "comparison",
            Self::BitAnd => "bitwise and",
            Self::BitXor => "bitwise xor",
            Self::Shl => "left shift",
        }
    }

    /// Whether this operator yields a boolean.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}
