//! Runtime values of the SOM interpreter.
//!
//! # Integer representation
//!
//! Integers have two representations: `Value::Integer` (machine width,
//! `ScalarInt`) and `Value::BigInteger` (arbitrary precision). A
//! `BigInteger` is only ever built through [`Value::big_integer`], which
//! demotes to `Integer` whenever the value fits in 64 bits. Code that
//! pattern-matches on `BigInteger` may therefore assume the magnitude is
//! outside the `i64` range.
//!
//! # Ownership
//!
//! Immutable payloads (strings, symbols, big integers) share their
//! allocation through `Heap<T>`. Instances and activations are shared,
//! mutable and single-threaded (`Rc` + `RefCell`); a `Value` is not `Send`.

mod heap;
mod object;
mod scalar_int;

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

pub use heap::Heap;
pub use object::{BlockValue, Class, ClassRef, ForeignHandle, Instance};
pub use scalar_int::ScalarInt;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    // Value types (compared by content, immutable)
    Nil,
    Bool(bool),
    /// Machine-width integer.
    Integer(ScalarInt),
    /// Arbitrary-precision integer; never fits in `i64`.
    BigInteger(Heap<BigInt>),
    Double(f64),
    String(Heap<str>),
    Symbol(Heap<str>),

    // Reference types
    /// Instance of a user class.
    Instance(Instance),
    /// A class used as a value.
    Class(ClassRef),
    /// Closure over an activation.
    Block(BlockValue),

    /// Host-only handle. Evaluation may produce it, but it is not a runtime
    /// object: it has no class and storing it into a slot is a coercion error.
    Foreign(ForeignHandle),
}

impl Value {
    /// Create a machine-width integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Integer(ScalarInt::new(n))
    }

    /// Create an integer from an arbitrary-precision result.
    ///
    /// Reduces to the narrowest exact representation: `Integer` when the
    /// value fits in `i64`, `BigInteger` otherwise.
    pub fn big_integer(n: BigInt) -> Self {
        match n.to_i64() {
            Some(small) => Value::int(small),
            None => Value::BigInteger(Heap::new(n)),
        }
    }

    #[inline]
    pub fn double(d: f64) -> Self {
        Value::Double(d)
    }

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Heap::from_text(s.as_ref()))
    }

    pub fn symbol(s: impl AsRef<str>) -> Self {
        Value::Symbol(Heap::from_text(s.as_ref()))
    }

    /// Whether this value has value semantics.
    ///
    /// Numbers, strings, symbols, booleans and nil are value types; an
    /// instance is a value type when its class is a value class. Classes,
    /// blocks and foreign handles are identity types.
    pub fn is_value_type(&self) -> bool {
        match self {
            Value::Nil
            | Value::Bool(_)
            | Value::Integer(_)
            | Value::BigInteger(_)
            | Value::Double(_)
            | Value::String(_)
            | Value::Symbol(_) => true,
            Value::Instance(obj) => obj.is_value(),
            Value::Class(_) | Value::Block(_) | Value::Foreign(_) => false,
        }
    }

    /// Short name of the representation, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Boolean",
            Value::Integer(_) | Value::BigInteger(_) => "Integer",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Instance(_) => "Object",
            Value::Class(_) => "Class",
            Value::Block(_) => "Block",
            Value::Foreign(_) => "foreign value",
        }
    }

    /// Integer value widened to arbitrary precision.
    pub fn as_big(&self) -> Option<BigInt> {
        match self {
            Value::Integer(n) => Some(n.to_big()),
            Value::BigInteger(n) => Some((**n).clone()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(&**s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::big_integer(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::BigInteger(n) => write!(f, "BigInteger({})", &**n),
            Value::Double(d) => write!(f, "Double({d:?})"),
            Value::String(s) => write!(f, "String({:?})", &**s),
            Value::Symbol(s) => write!(f, "Symbol(#{})", &**s),
            Value::Instance(obj) => write!(f, "{obj:?}"),
            Value::Class(class) => write!(f, "Class({})", class.name()),
            Value::Block(block) => write!(f, "{block:?}"),
            Value::Foreign(handle) => write!(f, "Foreign({})", handle.0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::BigInteger(n) => write!(f, "{}", &**n),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::String(s) => write!(f, "{}", &**s),
            Value::Symbol(s) => write!(f, "#{}", &**s),
            Value::Instance(obj) => match obj.class() {
                Some(class) => write!(f, "instance of {}", class.name()),
                None => write!(f, "instance of <no class>"),
            },
            Value::Class(class) => write!(f, "{}", class.name()),
            Value::Block(_) => write!(f, "a Block"),
            Value::Foreign(handle) => write!(f, "<foreign {}>", handle.0),
        }
    }
}

/// Structural equality: value types by content, reference types by identity.
///
/// This is representation-exact (`Integer(1) != Double(1.0)`); the
/// language-level `=` with numeric promotion lives in the numeric tower.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInteger(a), Value::BigInteger(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) | (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => {
                if a.is_value() {
                    Instance::content_eq(a, b)
                } else {
                    Instance::ptr_eq(a, b)
                }
            }
            (Value::Class(a), Value::Class(b)) => ClassRef::same(a, b),
            (Value::Block(a), Value::Block(b)) => BlockValue::ptr_eq(a, b),
            (Value::Foreign(a), Value::Foreign(b)) => a == b,
            _ => false,
        }
    }
}
