//! Statement parsing: control flow, assignment, print, return, blocks.

use sigma_common::token::TokenKind;

use crate::ast::Stmt;

use super::{expressions, items, Parser};

/// Parse a single statement. Returns `None` on failure; the caller
/// synchronizes.
pub(crate) fn statement(p: &mut Parser) -> Option<Stmt> {
    match p.current() {
        TokenKind::If => if_statement(p),
        TokenKind::While => while_statement(p),
        TokenKind::For => for_each_statement(p),
        TokenKind::Return => return_statement(p),
        TokenKind::LBrace => block(p),
        TokenKind::Ident if is_print_call(p) => print_statement(p),
        TokenKind::Ident if p.nth(1) == TokenKind::Eq => assignment(p),
        _ => expression_statement(p),
    }
}

/// Whether the statement starts with `print(` or `println(`.
fn is_print_call(p: &Parser) -> bool {
    p.nth(1) == TokenKind::LParen && matches!(p.current_text(), "print" | "println")
}

/// `ifStmt := 'if' '(' expression ')' statement ('else' statement)?`
///
/// A dangling `else` attaches to the nearest preceding `if`, which falls
/// out of the recursion for free.
fn if_statement(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.advance(); // 'if'
    p.expect(TokenKind::LParen, "'(' after 'if'")?;
    let cond = expressions::expr(p)?;
    p.expect(TokenKind::RParen, "')' after condition")?;
    let then_branch = statement(p)?;
    let mut span = start.merge(then_branch.span());
    let else_branch = if p.eat(TokenKind::Else) {
        let stmt = statement(p)?;
        span = span.merge(stmt.span());
        Some(Box::new(stmt))
    } else {
        None
    };
    Some(Stmt::If {
        cond,
        then_branch: Box::new(then_branch),
        else_branch,
        span,
    })
}

/// `whileStmt := 'while' '(' expression ')' statement`
fn while_statement(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.advance(); // 'while'
    p.expect(TokenKind::LParen, "'(' after 'while'")?;
    let cond = expressions::expr(p)?;
    p.expect(TokenKind::RParen, "')' after condition")?;
    let body = statement(p)?;
    let span = start.merge(body.span());
    Some(Stmt::While {
        cond,
        body: Box::new(body),
        span,
    })
}

/// `forStmt := 'for' '(' type? IDENT 'in' expression ')' statement`
///
/// The element type may be omitted; `for (x in xs)` and
/// `for (int x in xs)` both parse.
fn for_each_statement(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.advance(); // 'for'
    p.expect(TokenKind::LParen, "'(' after 'for'")?;

    let ty = if p.current() != TokenKind::Ident || p.nth(1) == TokenKind::Ident {
        Some(items::type_name(p)?)
    } else {
        None
    };
    let var_tok = p.expect(TokenKind::Ident, "loop variable name")?;
    let var = var_tok.text(p.source).to_string();
    p.expect(TokenKind::In, "'in'")?;
    let iterable = expressions::expr(p)?;
    p.expect(TokenKind::RParen, "')' after loop header")?;
    let body = statement(p)?;
    let span = start.merge(body.span());
    Some(Stmt::ForEach {
        ty,
        var,
        iterable,
        body: Box::new(body),
        span,
    })
}

/// `returnStmt := 'return' expression? ';'`
fn return_statement(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.advance(); // 'return'
    let value = if p.at(TokenKind::Semicolon) {
        None
    } else {
        Some(expressions::expr(p)?)
    };
    let end = p.expect(TokenKind::Semicolon, "';' after return")?;
    Some(Stmt::Return {
        value,
        span: start.merge(end.span),
    })
}

/// `block := '{' statement* '}'`
pub(crate) fn block(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    p.expect(TokenKind::LBrace, "'{'")?;
    let mut stmts = Vec::new();
    while !p.at(TokenKind::RBrace) && !p.at_eof() {
        let before = p.pos();
        match items::declaration_or_statement(p, false) {
            Some(stmt) => stmts.push(stmt),
            None => p.recover(before),
        }
    }
    let end = p.expect(TokenKind::RBrace, "'}'")?;
    Some(Stmt::Block {
        stmts,
        span: start.merge(end.span),
    })
}

/// `print(expr);` / `println(expr);` in statement position.
fn print_statement(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    let newline = p.current_text() == "println";
    p.advance(); // name
    p.advance(); // '('
    let expr = expressions::expr(p)?;
    p.expect(TokenKind::RParen, "')' after argument")?;
    let end = p.expect(TokenKind::Semicolon, "';'")?;
    Some(Stmt::Print {
        newline,
        expr,
        span: start.merge(end.span),
    })
}

/// `assignment := IDENT '=' expression ';'`
fn assignment(p: &mut Parser) -> Option<Stmt> {
    let start = p.current_span();
    let name = p.current_text().to_string();
    p.advance(); // name
    p.advance(); // '='
    let value = expressions::expr(p)?;
    let end = p.expect(TokenKind::Semicolon, "';' after assignment")?;
    Some(Stmt::Assign {
        name,
        value,
        span: start.merge(end.span),
    })
}

/// `expressionStmt := expression ';'`
fn expression_statement(p: &mut Parser) -> Option<Stmt> {
    let expr = expressions::expr(p)?;
    let end = p.expect(TokenKind::Semicolon, "';' after expression")?;
    let span = expr.span.merge(end.span);
    Some(Stmt::Expr { expr, span })
}

