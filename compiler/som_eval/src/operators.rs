//! Numeric tower: binary primitive operators.
//!
//! Operands are classified once into machine integer, big integer or double,
//! then each operator matches on the pair. The rules every arm follows:
//!
//! - Machine-integer arithmetic is checked. When the checked operation fails
//!   the same operation is recomputed on `BigInt`, so wraparound is never
//!   observable.
//! - Every `BigInt` result goes through [`Value::big_integer`], which demotes
//!   it back to a machine integer when it fits.
//! - A double operand makes the result a double, except for integer `/`
//!   double, which truncates the quotient toward zero.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use som_ir::BinaryOp;
use som_value::{
    binary_type_mismatch, division_by_zero, invalid_shift, type_coercion, EvalError, EvalResult,
    ScalarInt, Value,
};

/// Largest shift amount accepted by `<<`.
pub const MAX_SHIFT: i64 = 65_535;

/// 2^63 as an `f64`; the exclusive upper bound of `i64` in float space.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

#[derive(Copy, Clone)]
enum Int<'a> {
    Small(ScalarInt),
    Big(&'a BigInt),
}

impl Int<'_> {
    fn widen(self) -> BigInt {
        match self {
            Int::Small(n) => n.to_big(),
            Int::Big(n) => n.clone(),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Int::Small(n) => n.to_f64(),
            // BigInt::to_f64 saturates to infinity rather than failing.
            Int::Big(n) => n.to_f64().unwrap_or(f64::NAN),
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Int::Small(n) => n.is_zero(),
            Int::Big(n) => n.is_zero(),
        }
    }
}

#[derive(Copy, Clone)]
enum Num<'a> {
    Int(Int<'a>),
    Double(f64),
}

impl Num<'_> {
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(n) => n.to_f64(),
            Num::Double(d) => d,
        }
    }
}

fn classify(value: &Value) -> Option<Num<'_>> {
    match value {
        Value::Integer(n) => Some(Num::Int(Int::Small(*n))),
        Value::BigInteger(n) => Some(Num::Int(Int::Big(&**n))),
        Value::Double(d) => Some(Num::Double(*d)),
        _ => None,
    }
}

fn classify_pair<'v>(
    op: BinaryOp,
    left: &'v Value,
    right: &'v Value,
) -> Result<(Num<'v>, Num<'v>), EvalError> {
    match (classify(left), classify(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(binary_type_mismatch(op, left, right)),
    }
}

/// Evaluate a binary primitive.
///
/// Single dispatch point used by the evaluator; the per-operator functions
/// below are the same operations for primitive-library callers.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => subtract(left, right),
        BinaryOp::Mul => multiply(left, right),
        BinaryOp::Div => divide(left, right),
        BinaryOp::DoubleDiv => double_divide(left, right),
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Rem => remainder(left, right),
        BinaryOp::Eq => Ok(Value::Bool(equals(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!equals(left, right))),
        BinaryOp::Lt => compare(op, left, right, Ordering::is_lt),
        BinaryOp::LtEq => compare(op, left, right, Ordering::is_le),
        BinaryOp::Gt => compare(op, left, right, Ordering::is_gt),
        BinaryOp::GtEq => compare(op, left, right, Ordering::is_ge),
        BinaryOp::BitAnd => bit_and(left, right),
        BinaryOp::BitXor => bit_xor(left, right),
        BinaryOp::Shl => shift_left(left, right),
    }
}

// Arithmetic

/// Shared shape of `+ - *`: checked machine op, big fallback, float op.
fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    small: fn(ScalarInt, ScalarInt) -> Option<ScalarInt>,
    big: fn(BigInt, BigInt) -> BigInt,
    float: fn(f64, f64) -> f64,
) -> EvalResult {
    let (a, b) = classify_pair(op, left, right)?;
    Ok(match (a, b) {
        (Num::Int(Int::Small(x)), Num::Int(Int::Small(y))) => match small(x, y) {
            Some(n) => Value::Integer(n),
            None => Value::big_integer(big(x.to_big(), y.to_big())),
        },
        (Num::Int(x), Num::Int(y)) => Value::big_integer(big(x.widen(), y.widen())),
        (x, y) => Value::Double(float(x.to_f64(), y.to_f64())),
    })
}

pub fn add(left: &Value, right: &Value) -> EvalResult {
    arithmetic(
        BinaryOp::Add,
        left,
        right,
        ScalarInt::checked_add,
        |a, b| a + b,
        |a, b| a + b,
    )
}

pub fn subtract(left: &Value, right: &Value) -> EvalResult {
    arithmetic(
        BinaryOp::Sub,
        left,
        right,
        ScalarInt::checked_sub,
        |a, b| a - b,
        |a, b| a - b,
    )
}

pub fn multiply(left: &Value, right: &Value) -> EvalResult {
    arithmetic(
        BinaryOp::Mul,
        left,
        right,
        ScalarInt::checked_mul,
        |a, b| a * b,
        |a, b| a * b,
    )
}

/// `/`: truncating integer division.
///
/// - int / int: truncates toward zero; `i64::MIN / -1` promotes.
/// - int / double: float division truncated toward zero to an integer.
///   Fractional precision is dropped on purpose.
/// - double / anything: IEEE division.
pub fn divide(left: &Value, right: &Value) -> EvalResult {
    let op = BinaryOp::Div;
    let (a, b) = classify_pair(op, left, right)?;
    match (a, b) {
        (Num::Int(_), Num::Int(y)) if y.is_zero() => Err(division_by_zero(op)),
        (Num::Int(Int::Small(x)), Num::Int(Int::Small(y))) => Ok(match x.checked_div(y) {
            Some(q) => Value::Integer(q),
            None => Value::big_integer(x.to_big() / y.to_big()),
        }),
        (Num::Int(x), Num::Int(y)) => Ok(Value::big_integer(x.widen() / y.widen())),
        (Num::Int(x), Num::Double(y)) => truncating_float_divide(x.to_f64(), y),
        (Num::Double(x), y) => Ok(Value::Double(x / y.to_f64())),
    }
}

fn truncating_float_divide(dividend: f64, divisor: f64) -> EvalResult {
    if divisor == 0.0 {
        return Err(division_by_zero(BinaryOp::Div));
    }
    let quotient = (dividend / divisor).trunc();
    if !quotient.is_finite() {
        return Err(type_coercion(
            "Double",
            format!("quotient {quotient} has no integer representation"),
        ));
    }
    if (-I64_LIMIT..I64_LIMIT).contains(&quotient) {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "range checked above; value is already integral"
        )]
        let truncated = quotient as i64;
        return Ok(Value::int(truncated));
    }
    BigInt::from_f64(quotient)
        .map(Value::big_integer)
        .ok_or_else(|| type_coercion("Double", format!("quotient {quotient} is not integral")))
}

/// `//`: always float division, any numeric operands.
pub fn double_divide(left: &Value, right: &Value) -> EvalResult {
    let (a, b) = classify_pair(BinaryOp::DoubleDiv, left, right)?;
    Ok(Value::Double(a.to_f64() / b.to_f64()))
}

/// `%`: floored modulo; the result takes the divisor's sign.
pub fn modulo(left: &Value, right: &Value) -> EvalResult {
    let op = BinaryOp::Mod;
    let (a, b) = classify_pair(op, left, right)?;
    match (a, b) {
        (Num::Int(_), Num::Int(y)) if y.is_zero() => Err(division_by_zero(op)),
        (Num::Int(Int::Small(x)), Num::Int(Int::Small(y))) => Ok(match x.checked_mod_floor(y) {
            Some(r) => Value::Integer(r),
            None => Value::big_integer(x.to_big().mod_floor(&y.to_big())),
        }),
        (Num::Int(x), Num::Int(y)) => Ok(Value::big_integer(x.widen().mod_floor(&y.widen()))),
        (x, y) => {
            let (x, y) = (x.to_f64(), y.to_f64());
            let r = x % y;
            let floored = if r != 0.0 && (r < 0.0) != (y < 0.0) {
                r + y
            } else {
                r
            };
            Ok(Value::Double(floored))
        }
    }
}

/// `rem:`: truncated remainder; the result takes the dividend's sign.
pub fn remainder(left: &Value, right: &Value) -> EvalResult {
    let op = BinaryOp::Rem;
    let (a, b) = classify_pair(op, left, right)?;
    match (a, b) {
        (Num::Int(_), Num::Int(y)) if y.is_zero() => Err(division_by_zero(op)),
        (Num::Int(Int::Small(x)), Num::Int(Int::Small(y))) => Ok(match x.checked_rem(y) {
            Some(r) => Value::Integer(r),
            None => Value::big_integer(x.to_big() % y.to_big()),
        }),
        (Num::Int(x), Num::Int(y)) => Ok(Value::big_integer(x.widen() % y.widen())),
        (x, y) => Ok(Value::Double(x.to_f64() % y.to_f64())),
    }
}

// Comparison

fn numeric_ordering(a: Num<'_>, b: Num<'_>) -> Option<Ordering> {
    match (a, b) {
        (Num::Int(Int::Small(x)), Num::Int(Int::Small(y))) => Some(x.cmp(&y)),
        (Num::Int(x), Num::Int(y)) => Some(x.widen().cmp(&y.widen())),
        (x, y) => x.to_f64().partial_cmp(&y.to_f64()),
    }
}

/// Ordered comparison. Unordered pairs (NaN) answer false.
fn compare(op: BinaryOp, left: &Value, right: &Value, test: fn(Ordering) -> bool) -> EvalResult {
    let (a, b) = classify_pair(op, left, right)?;
    Ok(Value::Bool(numeric_ordering(a, b).is_some_and(test)))
}

/// `=`: numbers by numeric value across representations, everything else by
/// the value's own equality (content for value types, identity otherwise).
pub fn equals(left: &Value, right: &Value) -> bool {
    match (classify(left), classify(right)) {
        (Some(a), Some(b)) => numeric_ordering(a, b) == Some(Ordering::Equal),
        _ => left == right,
    }
}

pub fn less_than(left: &Value, right: &Value) -> EvalResult {
    compare(BinaryOp::Lt, left, right, Ordering::is_lt)
}

pub fn greater_than(left: &Value, right: &Value) -> EvalResult {
    compare(BinaryOp::Gt, left, right, Ordering::is_gt)
}

// Bitwise

fn integer_pair<'v>(
    op: BinaryOp,
    left: &'v Value,
    right: &'v Value,
) -> Result<(Int<'v>, Int<'v>), EvalError> {
    match classify_pair(op, left, right)? {
        (Num::Int(a), Num::Int(b)) => Ok((a, b)),
        _ => Err(binary_type_mismatch(op, left, right)),
    }
}

pub fn bit_and(left: &Value, right: &Value) -> EvalResult {
    Ok(match integer_pair(BinaryOp::BitAnd, left, right)? {
        (Int::Small(a), Int::Small(b)) => Value::Integer(a & b),
        (a, b) => Value::big_integer(a.widen() & b.widen()),
    })
}

pub fn bit_xor(left: &Value, right: &Value) -> EvalResult {
    Ok(match integer_pair(BinaryOp::BitXor, left, right)? {
        (Int::Small(a), Int::Small(b)) => Value::Integer(a ^ b),
        (a, b) => Value::big_integer(a.widen() ^ b.widen()),
    })
}

/// `<<`: left shift; overflowing results promote.
pub fn shift_left(left: &Value, right: &Value) -> EvalResult {
    let (value, amount) = integer_pair(BinaryOp::Shl, left, right)?;
    let amount = match amount {
        Int::Small(n) if (0..=MAX_SHIFT).contains(&n.raw()) => n.raw().unsigned_abs(),
        Int::Small(n) => return Err(invalid_shift(n)),
        Int::Big(n) => return Err(invalid_shift(n)),
    };
    // amount <= MAX_SHIFT, so both conversions are lossless.
    let (bits32, bits) = (
        u32::try_from(amount).unwrap_or(u32::MAX),
        usize::try_from(amount).unwrap_or(usize::MAX),
    );
    Ok(match value {
        Int::Small(n) => match n.checked_shl(bits32) {
            Some(shifted) => Value::Integer(shifted),
            None => Value::big_integer(n.to_big() << bits),
        },
        Int::Big(n) => Value::big_integer(n << bits),
    })
}
