//! Script-wrapping transform.
//!
//! Runs between parsing and semantic analysis when the driver asks for it.
//! Loose top-level statements move, in their original order, into a
//! synthesized `Script` class with a single `void run()` method; top-level
//! method declarations become additional members of `Script`; existing
//! class declarations are appended after it. A unit containing only class
//! declarations is returned unchanged, which makes the transform
//! idempotent.

use sigma_common::span::Span;
use sigma_parser::ast::{CompilationUnit, MethodDecl, Stmt, TypeName};

/// The name of the synthesized wrapper class.
pub const SCRIPT_CLASS: &str = "Script";

/// The name of the synthesized entry method.
pub const SCRIPT_RUN: &str = "run";

/// Wrap loose top-level statements into `Script.run()`.
pub fn wrap_script(unit: CompilationUnit) -> CompilationUnit {
    let only_classes = unit.stmts.iter().all(|s| matches!(s, Stmt::Class { .. }));
    if only_classes {
        return unit;
    }

    let unit_span = unit.span;
    let mut run_body = Vec::new();
    let mut script_methods = Vec::new();
    let mut classes = Vec::new();

    for stmt in unit.stmts {
        match stmt {
            Stmt::Class { .. } => classes.push(stmt),
            Stmt::Method(_) => script_methods.push(stmt),
            other => run_body.push(other),
        }
    }

    let body_span = cover(&run_body).unwrap_or(Span::point(unit_span.start));
    let run = Stmt::Method(MethodDecl {
        return_ty: TypeName::new("void", Span::point(body_span.start)),
        name: SCRIPT_RUN.to_string(),
        params: Vec::new(),
        body: run_body,
        span: body_span,
    });

    let mut members = Vec::with_capacity(1 + script_methods.len());
    members.push(run);
    members.extend(script_methods);

    let mut stmts = Vec::with_capacity(1 + classes.len());
    stmts.push(Stmt::Class {
        name: SCRIPT_CLASS.to_string(),
        members,
        span: body_span,
    });
    stmts.extend(classes);

    CompilationUnit {
        stmts,
        span: unit_span,
    }
}

/// The span covering a run of statements.
fn cover(stmts: &[Stmt]) -> Option<Span> {
    let first = stmts.first()?.span();
    Some(stmts.iter().fold(first, |acc, s| acc.merge(s.span())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_parser::parse;

    fn wrap(source: &str) -> CompilationUnit {
        let parse = parse(source);
        assert!(parse.ok(), "errors: {:?}", parse.formatted_errors(source));
        wrap_script(parse.unit)
    }

    #[test]
    fn loose_statements_move_into_script_run() {
        let unit = wrap("int x = 1; print(x);");
        assert_eq!(unit.stmts.len(), 1);
        match &unit.stmts[0] {
            Stmt::Class { name, members, .. } => {
                assert_eq!(name, SCRIPT_CLASS);
                assert_eq!(members.len(), 1);
                match &members[0] {
                    Stmt::Method(m) => {
                        assert_eq!(m.name, SCRIPT_RUN);
                        assert_eq!(m.return_ty.name, "void");
                        assert!(m.params.is_empty());
                        assert_eq!(m.body.len(), 2);
                        // Original order preserved.
                        assert!(matches!(m.body[0], Stmt::VarDecl { .. }));
                        assert!(matches!(m.body[1], Stmt::Print { .. }));
                    }
                    other => panic!("expected run method, got {other:?}"),
                }
            }
            other => panic!("expected Script class, got {other:?}"),
        }
    }

    #[test]
    fn top_level_methods_become_script_members() {
        let unit = wrap("int twice(int n) { return n * 2; } print(twice(4));");
        match &unit.stmts[0] {
            Stmt::Class { members, .. } => {
                assert_eq!(members.len(), 2);
                assert!(matches!(&members[0], Stmt::Method(m) if m.name == SCRIPT_RUN));
                assert!(matches!(&members[1], Stmt::Method(m) if m.name == "twice"));
            }
            other => panic!("expected Script class, got {other:?}"),
        }
    }

    #[test]
    fn existing_classes_are_appended_after_script() {
        let unit = wrap("class Point { int x; } int a = 1;");
        assert_eq!(unit.stmts.len(), 2);
        assert!(matches!(&unit.stmts[0], Stmt::Class { name, .. } if name == SCRIPT_CLASS));
        assert!(matches!(&unit.stmts[1], Stmt::Class { name, .. } if name == "Point"));
    }

    #[test]
    fn class_only_unit_is_unchanged() {
        let unit = wrap("class A { int x; } class B { int y; }");
        assert_eq!(unit.stmts.len(), 2);
        assert!(matches!(&unit.stmts[0], Stmt::Class { name, .. } if name == "A"));
        assert!(matches!(&unit.stmts[1], Stmt::Class { name, .. } if name == "B"));
    }

    #[test]
    fn wrapping_is_idempotent() {
        let once = wrap("int x = 1;");
        let twice = wrap_script(once.clone());
        assert_eq!(once.stmts.len(), twice.stmts.len());
        match (&once.stmts[0], &twice.stmts[0]) {
            (
                Stmt::Class {
                    name: a,
                    members: ma,
                    ..
                },
                Stmt::Class {
                    name: b,
                    members: mb,
                    ..
                },
            ) => {
                assert_eq!(a, b);
                assert_eq!(ma.len(), mb.len());
            }
            other => panic!("expected two Script classes, got {other:?}"),
        }
    }

    #[test]
    fn empty_unit_is_unchanged() {
        let unit = wrap("");
        assert!(unit.stmts.is_empty());
    }
}
