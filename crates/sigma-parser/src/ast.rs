//! Tagged-variant AST for Sigma.
//!
//! The tree is a pair of sum types, [`Stmt`] and [`Expr`], with a source
//! span on every node. Each node exclusively owns its children; there are
//! no back references and no cycles.
//!
//! Every expression carries an [`ExprId`] assigned by the parser from a
//! monotonic counter. The id is the stable identity key for the semantic
//! analyzer's expression-type map: two syntactically identical expressions
//! in different contexts have different ids, so shadowing cannot confuse
//! their types.

use std::fmt;

use serde::Serialize;

use sigma_common::span::Span;

/// Stable identity of an expression node, assigned at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(pub u32);

/// The top-level container for one source file's statements and
/// declarations.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A type reference in a declaration, by source name.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: String,
    pub span: Span,
}

impl TypeName {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeName,
    pub name: String,
    pub span: Span,
}

/// A method declaration. Split out of [`Stmt`] because the script-wrapping
/// transform and the IR generator both handle methods as a unit.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub return_ty: TypeName,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A Sigma statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `T name;` / `T name = init;` / `final T name = init;`
    VarDecl {
        ty: TypeName,
        name: String,
        init: Option<Expr>,
        is_const: bool,
        span: Span,
    },
    /// `name = value;`
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `expr;` -- evaluated for effect, result discarded.
    Expr { expr: Expr, span: Span },
    /// `print(expr);` or `println(expr);` in statement position.
    Print {
        newline: bool,
        expr: Expr,
        span: Span,
    },
    /// `if (cond) then else?`
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    /// `while (cond) body`
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    /// `for (T? var in iterable) body`
    ForEach {
        ty: Option<TypeName>,
        var: String,
        iterable: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    /// `return expr?;`
    Return { value: Option<Expr>, span: Span },
    /// `{ ... }`
    Block { stmts: Vec<Stmt>, span: Span },
    /// `T name(params) { ... }`
    Method(MethodDecl),
    /// `class Name { members }`
    Class {
        name: String,
        members: Vec<Stmt>,
        span: Span,
    },
    /// A variable declaration in class-body position.
    Field {
        ty: TypeName,
        name: String,
        init: Option<Expr>,
        span: Span,
    },
}

impl Stmt {
    /// The source span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::ForEach { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::Class { span, .. }
            | Stmt::Field { span, .. } => *span,
            Stmt::Method(m) => m.span,
        }
    }
}

/// A Sigma expression with stable identity and source span.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

/// The expression variants.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal. Parsed as `i64`; the 32-bit range check is the
    /// analyzer's job.
    Int(i64),
    /// Floating-point literal.
    Double(f64),
    /// String literal with escapes already processed.
    Str(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
    /// A name reference.
    Ident(String),
    /// `lhs op rhs`
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `op operand`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `callee(args)` -- callee is an identifier or a member access.
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `object.name`
    Member { object: Box<Expr>, name: String },
    /// `new ClassName(args)`
    New {
        class_name: String,
        args: Vec<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Boolean
    And,
    Or,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Mod => write!(f, "%"),
            BinOp::Pow => write!(f, "**"),
            BinOp::Eq => write!(f, "=="),
            BinOp::NotEq => write!(f, "!="),
            BinOp::Lt => write!(f, "<"),
            BinOp::LtEq => write!(f, "<="),
            BinOp::Gt => write!(f, ">"),
            BinOp::GtEq => write!(f, ">="),
            BinOp::And => write!(f, "&&"),
            BinOp::Or => write!(f, "||"),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Boolean negation.
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binop_display() {
        assert_eq!(BinOp::Pow.to_string(), "**");
        assert_eq!(BinOp::NotEq.to_string(), "!=");
        assert_eq!(BinOp::And.to_string(), "&&");
    }

    #[test]
    fn unaryop_display() {
        assert_eq!(UnaryOp::Neg.to_string(), "-");
        assert_eq!(UnaryOp::Not.to_string(), "!");
    }

    #[test]
    fn stmt_span_accessor() {
        let stmt = Stmt::Return {
            value: None,
            span: Span::new(3, 10),
        };
        assert_eq!(stmt.span(), Span::new(3, 10));
    }
}
