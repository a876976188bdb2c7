//! Declaration parsing and the declaration-vs-statement tie-break.
//!
//! Attempt order per the grammar: `class`-prefixed, then `final`-prefixed,
//! then `type IDENT` with lookahead (`(` means method, otherwise variable),
//! and finally plain statements. The `IDENT IDENT` case (class-typed
//! declarations) is resolved by speculative parsing with save/restore.

use sigma_common::token::TokenKind;

use crate::ast::{CompilationUnit, MethodDecl, Param, Stmt, TypeName};

use super::{expressions, statements, Parser};

/// Parse a whole compilation unit: declarations and statements until `Eof`.
pub(crate) fn compilation_unit(p: &mut Parser) -> CompilationUnit {
    let start = p.current_span();
    let mut stmts = Vec::new();
    let mut end = start;
    while !p.at_eof() {
        let before = p.pos();
        match declaration_or_statement(p, false) {
            Some(stmt) => {
                end = end.merge(stmt.span());
                stmts.push(stmt);
            }
            None => p.recover(before),
        }
    }
    CompilationUnit {
        stmts,
        span: start.merge(end),
    }
}

/// Parse one declaration or statement. `in_class` switches plain variable
/// declarations into field declarations.
pub(crate) fn declaration_or_statement(p: &mut Parser, in_class: bool) -> Option<Stmt> {
    match p.current() {
        TokenKind::Class => class_decl(p),
        TokenKind::Final => constant_decl(p),
        TokenKind::Int
        | TokenKind::Double
        | TokenKind::Float
        | TokenKind::Boolean
        | TokenKind::StringKw
        | TokenKind::Void => typed_declaration(p, in_class),
        // `IDENT IDENT` can only start a class-typed declaration; try it
        // speculatively and fall back to a statement on failure.
        TokenKind::Ident if p.nth(1) == TokenKind::Ident => {
            let mark = p.save();
            match typed_declaration(p, in_class) {
                Some(stmt) => Some(stmt),
                None => {
                    p.restore(mark);
                    statements::statement(p)
                }
            }
        }
        _ => statements::statement(p),
    }
}

/// Parse a type reference: a type keyword, `void`, or a class name.
pub(crate) fn type_name(p: &mut Parser) -> Option<TypeName> {
    match p.current() {
        TokenKind::Int
        | TokenKind::Double
        | TokenKind::Float
        | TokenKind::Boolean
        | TokenKind::StringKw
        | TokenKind::Void
        | TokenKind::Ident => {
            let span = p.current_span();
            let name = p.current_text().to_string();
            p.advance();
            Some(TypeName::new(name, span))
        }
        _ => {
            p.error(format!("expected type, found '{}'", p.describe_current()));
            None
        }
    }
}

/// `classDecl := 'class' IDENT '{' (declaration | statement)* '}'`
fn class_decl(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.advance(); // 'class'
    let name_tok = p.expect(TokenKind::Ident, "class name")?;
    let name = name_tok.text(p.source).to_string();
    p.expect(TokenKind::LBrace, "'{' after class name")?;

    let mut members = Vec::new();
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let before = p.pos();
        match declaration_or_statement(p, true) {
            Some(member) => members.push(member),
            None => p.recover(before),
        }
    }
    let end = p.expect(TokenKind::RBrace, "'}' to close class body")?;
    Some(Stmt::Class {
        name,
        members,
        span: start.merge(end.span),
    })
}

/// `constantDecl := 'final' type IDENT ('=' expression)? ';'`
///
/// A missing initializer parses fine; flagging it is the analyzer's job
/// (constant-without-initializer).
fn constant_decl(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.advance(); // 'final'
    let ty = type_name(p)?;
    let name_tok = p.expect(TokenKind::Ident, "constant name")?;
    let name = name_tok.text(p.source).to_string();
    let init = if p.eat(TokenKind::Eq) {
        Some(expressions::expr(p)?)
    } else {
        None
    };
    let end = p.expect(TokenKind::Semicolon, "';' after constant declaration")?;
    Some(Stmt::VarDecl {
        ty,
        name,
        init,
        is_const: true,
        span: start.merge(end.span),
    })
}

/// A declaration starting with a type: `T name(...)` is a method,
/// `T name (= expr)? ;` is a variable (or field inside a class body).
fn typed_declaration(p: &mut Parser, in_class: bool) -> Option<Stmt> {
    let start = p.current_span();
    let ty = type_name(p)?;
    let name_tok = p.expect(TokenKind::Ident, "name after type")?;
    let name = name_tok.text(p.source).to_string();

    if p.at(TokenKind::LParen) {
        return method_decl(p, ty, name);
    }

    if ty.name == "void" {
        p.error_at(
            "'void' is only valid as a method return type".to_string(),
            ty.span,
        );
        return None;
    }

    let init = if p.eat(TokenKind::Eq) {
        Some(expressions::expr(p)?)
    } else {
        None
    };
    let end = p.expect(TokenKind::Semicolon, "';' after declaration")?;
    let span = start.merge(end.span);

    if in_class {
        Some(Stmt::Field {
            ty,
            name,
            init,
            span,
        })
    } else {
        Some(Stmt::VarDecl {
            ty,
            name,
            init,
            is_const: false,
            span,
        })
    }
}

/// `methodDecl := type IDENT '(' params? ')' block` -- the type and name
/// have already been consumed by the caller.
fn method_decl(p: &mut Parser, return_ty: TypeName, name: String) -> Option<Stmt> {
    let start = return_ty.span;
    p.advance(); // '('
    let params = parameters(p)?;
    p.expect(TokenKind::RParen, "')' after parameters")?;

    let body_stmt = statements::block(p)?;
    let (body, body_span) = match body_stmt {
        Stmt::Block { stmts, span } => (stmts, span),
        _ => unreachable!("block() returns Stmt::Block"),
    };

    Some(Stmt::Method(MethodDecl {
        return_ty,
        name,
        params,
        body,
        span: start.merge(body_span),
    }))
}

/// `params := type IDENT (',' type IDENT)*`
fn parameters(p: &mut Parser) -> Option<Vec<Param>> {
    let mut params = Vec::new();
    if p.at(TokenKind::RParen) {
        return Some(params);
    }
    loop {
        let ty = type_name(p)?;
        let name_tok = p.expect(TokenKind::Ident, "parameter name")?;
        let span = ty.span.merge(name_tok.span);
        let name = name_tok.text(p.source).to_string();
        params.push(Param { ty, name, span });
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    Some(params)
}
