//! Semantic error and warning types.
//!
//! Each variant carries the spans needed for a precise diagnostic. Human
//! rendering lives in two places: `Display` gives the terse one-line
//! message, and [`crate::diagnostics`] produces the full source-annotated
//! report.

use std::fmt;

use sigma_common::span::{SourceMap, Span};

use crate::ty::Ty;

/// A semantic error found during analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticError {
    /// A name was defined twice in the same scope.
    DuplicateDefinition {
        name: String,
        span: Span,
        previous: Span,
    },
    /// A name was used but never declared.
    UndefinedIdentifier { name: String, span: Span },
    /// A declaration referenced a type name that does not exist.
    UndefinedType { name: String, span: Span },
    /// A value of one type appeared where an incompatible type is expected.
    TypeMismatch {
        expected: Ty,
        found: Ty,
        span: Span,
    },
    /// `final` declaration with no initializer.
    ConstantWithoutInitializer { name: String, span: Span },
    /// Assignment to a `final` name.
    ConstantReassignment {
        name: String,
        span: Span,
        defined: Span,
    },
    /// Assignment to something that is not a variable, parameter, or field.
    NotAssignable { name: String, span: Span },
    /// A binary or unary operator applied to operand types it does not
    /// support.
    InvalidOperation {
        op: String,
        lhs: Ty,
        rhs: Option<Ty>,
        span: Span,
    },
    /// An `if`/`while` condition that is not boolean.
    ConditionType { found: Ty, span: Span },
    /// A `return` whose value does not match the enclosing method.
    ReturnTypeMismatch {
        expected: Ty,
        found: Ty,
        span: Span,
    },
    /// `return` outside of any method body.
    ReturnOutsideMethod { span: Span },
    /// A call with the wrong number of arguments.
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    /// A call argument incompatible with the declared parameter type.
    ArgumentTypeMismatch {
        name: String,
        index: usize,
        expected: Ty,
        found: Ty,
        span: Span,
    },
    /// A call target that is not a method.
    NotCallable { what: String, span: Span },
    /// Member access on a value that has no members.
    MemberAccessOnNonClass {
        ty: Ty,
        member: String,
        span: Span,
    },
    /// Member access naming a field or method the class does not have.
    UnknownMember {
        class_name: String,
        member: String,
        span: Span,
    },
    /// `new T(...)` where `T` is not a registered class.
    UnknownClass { name: String, span: Span },
    /// `print`/`println` of a value with no stringification.
    NotPrintable { ty: Ty, span: Span },
    /// Integer literal outside the 32-bit `int` range.
    IntLiteralOutOfRange { value: i64, span: Span },
    /// `for ... in` has no semantics yet.
    ForInUnsupported { span: Span },
}

impl SemanticError {
    /// The span the diagnostic anchors to.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::DuplicateDefinition { span, .. }
            | SemanticError::UndefinedIdentifier { span, .. }
            | SemanticError::UndefinedType { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::ConstantWithoutInitializer { span, .. }
            | SemanticError::ConstantReassignment { span, .. }
            | SemanticError::NotAssignable { span, .. }
            | SemanticError::InvalidOperation { span, .. }
            | SemanticError::ConditionType { span, .. }
            | SemanticError::ReturnTypeMismatch { span, .. }
            | SemanticError::ReturnOutsideMethod { span }
            | SemanticError::ArityMismatch { span, .. }
            | SemanticError::ArgumentTypeMismatch { span, .. }
            | SemanticError::NotCallable { span, .. }
            | SemanticError::MemberAccessOnNonClass { span, .. }
            | SemanticError::UnknownMember { span, .. }
            | SemanticError::UnknownClass { span, .. }
            | SemanticError::NotPrintable { span, .. }
            | SemanticError::IntLiteralOutOfRange { span, .. }
            | SemanticError::ForInUnsupported { span } => *span,
        }
    }

    /// Render as `line L:C: message` using the given source map.
    pub fn format(&self, map: &SourceMap) -> String {
        map.describe(self.span(), self)
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::DuplicateDefinition { name, .. } => {
                write!(f, "`{name}` is already defined in this scope")
            }
            SemanticError::UndefinedIdentifier { name, .. } => {
                write!(f, "undefined identifier `{name}`")
            }
            SemanticError::UndefinedType { name, .. } => {
                write!(f, "undefined type `{name}`")
            }
            SemanticError::TypeMismatch {
                expected, found, ..
            } => {
                write!(f, "type mismatch: expected `{expected}`, found `{found}`")
            }
            SemanticError::ConstantWithoutInitializer { name, .. } => {
                write!(f, "constant `{name}` must be initialized")
            }
            SemanticError::ConstantReassignment { name, .. } => {
                write!(f, "cannot reassign constant `{name}`")
            }
            SemanticError::NotAssignable { name, .. } => {
                write!(f, "`{name}` is not assignable")
            }
            SemanticError::InvalidOperation { op, lhs, rhs, .. } => match rhs {
                Some(rhs) => write!(
                    f,
                    "operator `{op}` cannot be applied to `{lhs}` and `{rhs}`"
                ),
                None => write!(f, "operator `{op}` cannot be applied to `{lhs}`"),
            },
            SemanticError::ConditionType { found, .. } => {
                write!(f, "condition must be `boolean`, found `{found}`")
            }
            SemanticError::ReturnTypeMismatch {
                expected, found, ..
            } => {
                write!(
                    f,
                    "return type mismatch: expected `{expected}`, found `{found}`"
                )
            }
            SemanticError::ReturnOutsideMethod { .. } => {
                write!(f, "`return` outside of a method")
            }
            SemanticError::ArityMismatch {
                name,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "`{name}` expects {expected} argument(s), found {found}"
                )
            }
            SemanticError::ArgumentTypeMismatch {
                name,
                index,
                expected,
                found,
                ..
            } => {
                write!(
                    f,
                    "argument {} of `{name}` expects `{expected}`, found `{found}`",
                    index + 1
                )
            }
            SemanticError::NotCallable { what, .. } => {
                write!(f, "`{what}` is not callable")
            }
            SemanticError::MemberAccessOnNonClass { ty, member, .. } => {
                write!(f, "type `{ty}` has no member `{member}`")
            }
            SemanticError::UnknownMember {
                class_name, member, ..
            } => {
                write!(f, "class `{class_name}` has no member `{member}`")
            }
            SemanticError::UnknownClass { name, .. } => {
                write!(f, "unknown class `{name}`")
            }
            SemanticError::NotPrintable { ty, .. } => {
                write!(f, "value of type `{ty}` is not printable")
            }
            SemanticError::IntLiteralOutOfRange { value, .. } => {
                write!(f, "integer literal {value} is out of range for `int`")
            }
            SemanticError::ForInUnsupported { .. } => {
                write!(f, "for-in loops are not supported yet")
            }
        }
    }
}

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticWarning {
    /// A non-boolean variable declared without an initializer
    /// (booleans default to `false`).
    UninitializedVariable { name: String, ty: Ty, span: Span },
}

impl SemanticWarning {
    pub fn span(&self) -> Span {
        match self {
            SemanticWarning::UninitializedVariable { span, .. } => *span,
        }
    }

    /// Render as `line L:C: message` using the given source map.
    pub fn format(&self, map: &SourceMap) -> String {
        map.describe(self.span(), self)
    }
}

impl fmt::Display for SemanticWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticWarning::UninitializedVariable { name, ty, .. } => {
                write!(f, "variable `{name}` of type `{ty}` is never initialized")
            }
        }
    }
}
