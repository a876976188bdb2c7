//! Type representation for the Sigma type system.
//!
//! Types form a small fixed lattice: four primitives, `String`, nominal
//! user classes, and the three special types `null`, `void`, and the error
//! type. There are no inference variables; every expression's type is
//! determined directly from its shape and its operands.

use std::fmt;

use serde::Serialize;

/// A Sigma type.
///
/// `Error` is the containment device for cascading failures: it is
/// compatible with every type in both directions, so a sub-expression that
/// failed to type produces exactly one diagnostic and enclosing expressions
/// do not chain-fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Ty {
    /// 32-bit signed integer.
    Int,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point. The only wide type: two JVM local slots.
    Double,
    /// Boolean.
    Boolean,
    /// The `String` reference type.
    Str,
    /// A user-declared class, compared nominally.
    Class(String),
    /// The type of the `null` literal.
    Null,
    /// The absence of a value; method return type only.
    Void,
    /// The error type. Bottom of the compatibility lattice.
    Error,
}

impl Ty {
    /// Whether this is one of the numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Float | Ty::Double)
    }

    /// Whether this type occupies two JVM local slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Ty::Double)
    }

    /// Whether a value of this type can be handed to `print`/`println`.
    /// Class instances have no stringification.
    pub fn is_printable(&self) -> bool {
        matches!(
            self,
            Ty::Int | Ty::Float | Ty::Double | Ty::Boolean | Ty::Str | Ty::Null | Ty::Error
        )
    }

    /// Assignability: is a value of this type usable where `dst` is
    /// expected?
    ///
    /// Identity, `Error` in either position, the numeric widening chain
    /// `int -> float -> double`, and `null` into any reference type.
    /// `void` is compatible with nothing, itself included.
    pub fn is_compatible_with(&self, dst: &Ty) -> bool {
        if matches!(self, Ty::Error) || matches!(dst, Ty::Error) {
            return true;
        }
        if matches!(self, Ty::Void) || matches!(dst, Ty::Void) {
            return false;
        }
        if self == dst {
            return true;
        }
        match (self, dst) {
            (Ty::Int, Ty::Float | Ty::Double) => true,
            (Ty::Float, Ty::Double) => true,
            (Ty::Null, Ty::Class(_) | Ty::Str) => true,
            _ => false,
        }
    }

    /// The widened result type of arithmetic on two numeric operands.
    ///
    /// Returns `None` when either operand is not numeric.
    pub fn widen(&self, other: &Ty) -> Option<Ty> {
        if !self.is_numeric() || !other.is_numeric() {
            return None;
        }
        let rank = |t: &Ty| match t {
            Ty::Int => 0,
            Ty::Float => 1,
            Ty::Double => 2,
            _ => unreachable!("is_numeric checked"),
        };
        Some(if rank(self) >= rank(other) {
            self.clone()
        } else {
            other.clone()
        })
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "int"),
            Ty::Float => write!(f, "float"),
            Ty::Double => write!(f, "double"),
            Ty::Boolean => write!(f, "boolean"),
            Ty::Str => write!(f, "String"),
            Ty::Class(name) => write!(f, "{name}"),
            Ty::Null => write!(f, "null"),
            Ty::Void => write!(f, "void"),
            Ty::Error => write!(f, "<error>"),
        }
    }
}
