//! Expression parsing: precedence climbing per the Sigma grammar.
//!
//! Precedence from loosest to tightest: `||`, `&&`, relational
//! (`< <= > >= == !=`), additive, multiplicative, `**` (right-assoc),
//! unary `! -`, postfix call/member, primary. All binary levels except
//! `**` are left-associative loops.

use sigma_common::token::TokenKind;

use crate::ast::{BinOp, Expr, ExprKind, UnaryOp};

use super::Parser;

/// Parse an expression. Returns `None` when no expression could be formed;
/// the caller is responsible for synchronizing.
pub(crate) fn expr(p: &mut Parser) -> Option<Expr> {
    logical_or(p)
}

/// `logicalOr := logicalAnd ('||' logicalAnd)*`
fn logical_or(p: &mut Parser) -> Option<Expr> {
    let mut lhs = logical_and(p)?;
    loop {
        if p.at(TokenKind::Bar) {
            // Recover a lone `|` as `||` with a hint diagnostic.
            p.error("unexpected '|'. Did you mean '||'?");
            p.advance();
        } else if !p.eat(TokenKind::PipePipe) {
            break;
        }
        let rhs = logical_and(p)?;
        lhs = binary(p, BinOp::Or, lhs, rhs);
    }
    Some(lhs)
}

/// `logicalAnd := relational ('&&' relational)*`
fn logical_and(p: &mut Parser) -> Option<Expr> {
    let mut lhs = relational(p)?;
    loop {
        if p.at(TokenKind::Amp) {
            // Recover a lone `&` as `&&` with a hint diagnostic.
            p.error("unexpected '&'. Did you mean '&&'?");
            p.advance();
        } else if !p.eat(TokenKind::AmpAmp) {
            break;
        }
        let rhs = relational(p)?;
        lhs = binary(p, BinOp::And, lhs, rhs);
    }
    Some(lhs)
}

/// `relational := additive (('<'|'<='|'>'|'>='|'=='|'!=') additive)*`
fn relational(p: &mut Parser) -> Option<Expr> {
    let mut lhs = additive(p)?;
    loop {
        let op = match p.current() {
            TokenKind::Lt => BinOp::Lt,
            TokenKind::LtEq => BinOp::LtEq,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::GtEq => BinOp::GtEq,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::NotEq,
            _ => break,
        };
        p.advance();
        let rhs = additive(p)?;
        lhs = binary(p, op, lhs, rhs);
    }
    Some(lhs)
}

/// `additive := multiplicative (('+'|'-') multiplicative)*`
fn additive(p: &mut Parser) -> Option<Expr> {
    let mut lhs = multiplicative(p)?;
    loop {
        let op = match p.current() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            _ => break,
        };
        p.advance();
        let rhs = multiplicative(p)?;
        lhs = binary(p, op, lhs, rhs);
    }
    Some(lhs)
}

/// `multiplicative := power (('*'|'/'|'%') power)*`
fn multiplicative(p: &mut Parser) -> Option<Expr> {
    let mut lhs = power(p)?;
    loop {
        let op = match p.current() {
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            _ => break,
        };
        p.advance();
        let rhs = power(p)?;
        lhs = binary(p, op, lhs, rhs);
    }
    Some(lhs)
}

/// `power := unary ('**' power)?` -- right-associative.
fn power(p: &mut Parser) -> Option<Expr> {
    let lhs = unary(p)?;
    if p.eat(TokenKind::StarStar) {
        let rhs = power(p)?;
        return Some(binary(p, BinOp::Pow, lhs, rhs));
    }
    Some(lhs)
}

/// `unary := '!' unary | '-' unary | postfix`
fn unary(p: &mut Parser) -> Option<Expr> {
    let op = match p.current() {
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Minus => UnaryOp::Neg,
        _ => return postfix(p),
    };
    let start = p.current_span();
    p.advance();
    let operand = unary(p)?;
    let span = start.merge(operand.span);
    Some(Expr {
        id: p.fresh_id(),
        kind: ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    })
}

/// `postfix := primary (('(' args? ')') | ('.' IDENT))*`
fn postfix(p: &mut Parser) -> Option<Expr> {
    let mut e = primary(p)?;
    loop {
        if p.at(TokenKind::LParen) {
            p.advance();
            let args = arguments(p)?;
            let close = p.expect(TokenKind::RParen, "')' after arguments")?;
            let span = e.span.merge(close.span);
            e = Expr {
                id: p.fresh_id(),
                kind: ExprKind::Call {
                    callee: Box::new(e),
                    args,
                },
                span,
            };
        } else if p.at(TokenKind::Dot) {
            p.advance();
            let member = p.expect(TokenKind::Ident, "member name after '.'")?;
            let span = e.span.merge(member.span);
            let name = member.text(p.source).to_string();
            e = Expr {
                id: p.fresh_id(),
                kind: ExprKind::Member {
                    object: Box::new(e),
                    name,
                },
                span,
            };
        } else {
            break;
        }
    }
    Some(e)
}

/// `primary := IDENT | literal | '(' expression ')' | 'new' type '(' args? ')'`
fn primary(p: &mut Parser) -> Option<Expr> {
    let span = p.current_span();
    match p.current() {
        TokenKind::IntLiteral => {
            let text = p.current_text().to_string();
            p.advance();
            let value = match text.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    p.error_at(format!("integer literal '{text}' is too large"), span);
                    0
                }
            };
            Some(make(p, ExprKind::Int(value), span))
        }
        TokenKind::FloatLiteral => {
            let text = p.current_text().to_string();
            p.advance();
            let value = text.parse::<f64>().unwrap_or(0.0);
            Some(make(p, ExprKind::Double(value), span))
        }
        TokenKind::StringLiteral => {
            let text = p.current_text().to_string();
            p.advance();
            Some(make(p, ExprKind::Str(unescape(&text)), span))
        }
        TokenKind::True => {
            p.advance();
            Some(make(p, ExprKind::Bool(true), span))
        }
        TokenKind::False => {
            p.advance();
            Some(make(p, ExprKind::Bool(false), span))
        }
        TokenKind::Null => {
            p.advance();
            Some(make(p, ExprKind::Null, span))
        }
        TokenKind::Ident => {
            let name = p.current_text().to_string();
            p.advance();
            Some(make(p, ExprKind::Ident(name), span))
        }
        TokenKind::LParen => {
            p.advance();
            let inner = expr(p)?;
            p.expect(TokenKind::RParen, "')'")?;
            Some(inner)
        }
        TokenKind::New => {
            p.advance();
            let class = p.expect(TokenKind::Ident, "class name after 'new'")?;
            let class_name = class.text(p.source).to_string();
            p.expect(TokenKind::LParen, "'(' after class name")?;
            let args = arguments(p)?;
            let close = p.expect(TokenKind::RParen, "')' after constructor arguments")?;
            Some(make(
                p,
                ExprKind::New { class_name, args },
                span.merge(close.span),
            ))
        }
        _ => {
            p.error(format!(
                "expected expression, found '{}'",
                p.describe_current()
            ));
            None
        }
    }
}

/// A comma-separated argument list; the caller handles the parentheses.
fn arguments(p: &mut Parser) -> Option<Vec<Expr>> {
    let mut args = Vec::new();
    if p.at(TokenKind::RParen) {
        return Some(args);
    }
    loop {
        args.push(expr(p)?);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    Some(args)
}

// ── Helpers ────────────────────────────────────────────────────────────

fn binary(p: &mut Parser, op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr {
        id: p.fresh_id(),
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    }
}

fn make(p: &mut Parser, kind: ExprKind, span: sigma_common::span::Span) -> Expr {
    Expr {
        id: p.fresh_id(),
        kind,
        span,
    }
}

/// Strip the surrounding quotes and process the five escapes. The lexer
/// already rejected anything else.
fn unescape(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
