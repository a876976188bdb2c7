//! Named entities produced by semantic analysis.

use sigma_common::span::Span;

use crate::ty::Ty;

/// What kind of entity a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Parameter,
    Method,
    Class,
    Field,
}

/// A named entity: variable, constant, parameter, method, class, or field.
///
/// `params` is populated for methods; `owner` names the containing class
/// for fields and methods declared inside one.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: Ty,
    pub kind: SymbolKind,
    /// Definition site, reported alongside duplicate definitions.
    pub span: Span,
    pub params: Option<Vec<Ty>>,
    pub owner: Option<String>,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, ty: Ty, span: Span) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: SymbolKind::Variable,
            span,
            params: None,
            owner: None,
        }
    }

    pub fn constant(name: impl Into<String>, ty: Ty, span: Span) -> Self {
        Self {
            kind: SymbolKind::Constant,
            ..Self::variable(name, ty, span)
        }
    }

    pub fn parameter(name: impl Into<String>, ty: Ty, span: Span) -> Self {
        Self {
            kind: SymbolKind::Parameter,
            ..Self::variable(name, ty, span)
        }
    }

    pub fn method(name: impl Into<String>, ret: Ty, params: Vec<Ty>, span: Span) -> Self {
        Self {
            name: name.into(),
            ty: ret,
            kind: SymbolKind::Method,
            span,
            params: Some(params),
            owner: None,
        }
    }

    pub fn class(name: impl Into<String>, span: Span) -> Self {
        let name = name.into();
        Self {
            ty: Ty::Class(name.clone()),
            kind: SymbolKind::Class,
            ..Self::variable(name, Ty::Error, span)
        }
    }

    pub fn field(name: impl Into<String>, ty: Ty, owner: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SymbolKind::Field,
            owner: Some(owner.into()),
            ..Self::variable(name, ty, span)
        }
    }

    /// Attach a containing class to this symbol.
    pub fn owned_by(mut self, class_name: impl Into<String>) -> Self {
        self.owner = Some(class_name.into());
        self
    }

    /// Whether this symbol may be the target of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Field
        )
    }
}
