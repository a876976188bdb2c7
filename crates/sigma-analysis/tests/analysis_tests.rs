//! End-to-end tests for the semantic analyzer: each diagnostic kind, the
//! expression-type map, scope behavior, and error containment.

use sigma_analysis::{analyze, SemanticError, SemanticResult, SemanticWarning};
use sigma_analysis::ty::Ty;
use sigma_common::span::SourceMap;
use sigma_parser::ast::{ExprKind, Stmt};
use sigma_parser::parse;

fn check(source: &str) -> SemanticResult {
    let parsed = parse(source);
    assert!(
        parsed.ok(),
        "parse errors in test source: {:?}",
        parsed.formatted_errors(source)
    );
    analyze(&parsed.unit)
}

fn first_error(source: &str) -> SemanticError {
    let result = check(source);
    assert!(
        !result.errors.is_empty(),
        "expected at least one error for: {source}"
    );
    result.errors[0].clone()
}

// ── Happy paths ────────────────────────────────────────────────────────

#[test]
fn simple_declaration_types_globally() {
    let result = check("int x = 10;");
    assert!(result.ok());
    let sym = result.table.global().get("x").expect("x in global scope");
    assert_eq!(sym.ty, Ty::Int);
}

#[test]
fn widening_assignments_are_accepted() {
    let result = check("double d = 1; float f = 2; double e = f;");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn string_concatenation_types_as_string() {
    let result = check("String s = \"n = \" + 42;");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn forward_method_references_resolve() {
    let result = check("int a() { return b(); } int b() { return 1; }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn forward_class_references_resolve() {
    let result = check("class A { B partner; } class B { int x; }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn methods_and_fields_of_classes_check() {
    let source = "class Counter {
        int count;
        void bump(int by) { count = count + by; }
        int value() { return count; }
    }
    Counter c = new Counter();
    c.bump(3);
    int v = c.value();";
    let result = check(source);
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn null_assigns_to_references_only() {
    assert!(check("String s = null;").ok());
    assert!(matches!(
        first_error("int x = null;"),
        SemanticError::TypeMismatch { .. }
    ));
}

#[test]
fn expression_types_are_recorded() {
    let source = "int x = 1 + 2;";
    let parsed = parse(source);
    let result = analyze(&parsed.unit);
    assert!(result.ok());

    let Stmt::VarDecl {
        init: Some(init), ..
    } = &parsed.unit.stmts[0]
    else {
        panic!("expected declaration");
    };
    assert_eq!(result.ty_of(init.id), Ty::Int);
    let ExprKind::Binary { lhs, rhs, .. } = &init.kind else {
        panic!("expected binary init");
    };
    assert_eq!(result.ty_of(lhs.id), Ty::Int);
    assert_eq!(result.ty_of(rhs.id), Ty::Int);
}

#[test]
fn analysis_is_deterministic_across_runs() {
    let source = "int x = 1; int y = x + 2; print(y);";
    let parsed = parse(source);
    let first = analyze(&parsed.unit);
    let second = analyze(&parsed.unit);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.expr_types, second.expr_types);
}

// ── Diagnostics, one per kind ──────────────────────────────────────────

#[test]
fn duplicate_definition() {
    assert!(matches!(
        first_error("int x = 1; int x = 2;"),
        SemanticError::DuplicateDefinition { name, .. } if name == "x"
    ));
}

#[test]
fn undefined_identifier() {
    assert!(matches!(
        first_error("int x = missing;"),
        SemanticError::UndefinedIdentifier { name, .. } if name == "missing"
    ));
}

#[test]
fn undefined_type() {
    assert!(matches!(
        first_error("Widget w;"),
        SemanticError::UndefinedType { name, .. } if name == "Widget"
    ));
}

#[test]
fn type_mismatch_in_declaration() {
    let result = check("int x = \"hello\";");
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        result.errors[0],
        SemanticError::TypeMismatch {
            expected: Ty::Int,
            found: Ty::Str,
            ..
        }
    ));
}

#[test]
fn narrowing_is_rejected() {
    assert!(matches!(
        first_error("double d = 1.5; int x = d;"),
        SemanticError::TypeMismatch { .. }
    ));
}

#[test]
fn constant_without_initializer() {
    assert!(matches!(
        first_error("final int MAX;"),
        SemanticError::ConstantWithoutInitializer { name, .. } if name == "MAX"
    ));
}

#[test]
fn formatted_errors_carry_line_and_column() {
    let source = "final int K = 1;\nK = 2;";
    let parsed = parse(source);
    let result = analyze(&parsed.unit);
    let map = SourceMap::new(source);
    let formatted: Vec<String> = result.errors.iter().map(|e| e.format(&map)).collect();
    insta::assert_snapshot!(
        formatted.join("\n"),
        @"line 2:1: cannot reassign constant `K`"
    );
}

#[test]
fn constant_reassignment() {
    let result = check("final int K = 1; K = 2;");
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        &result.errors[0],
        SemanticError::ConstantReassignment { name, .. } if name == "K"
    ));
}

#[test]
fn assignment_to_method_is_not_assignable() {
    assert!(matches!(
        first_error("void f() { } f = 1;"),
        SemanticError::NotAssignable { name, .. } if name == "f"
    ));
}

#[test]
fn invalid_operations() {
    assert!(matches!(
        first_error("boolean b = true + 1;"),
        SemanticError::InvalidOperation { .. }
    ));
    assert!(matches!(
        first_error("int x = 1.5 % 2;"),
        SemanticError::InvalidOperation { .. }
    ));
    assert!(matches!(
        first_error("boolean b = 1 && true;"),
        SemanticError::InvalidOperation { .. }
    ));
    assert!(matches!(
        first_error("int x = -true;"),
        SemanticError::InvalidOperation { .. }
    ));
    assert!(matches!(
        first_error("boolean b = !1;"),
        SemanticError::InvalidOperation { .. }
    ));
}

#[test]
fn operator_result_types() {
    let result = check(
        "double p = 2 ** 3;
         int m = 7 % 3;
         boolean c = 1 < 2;
         float f = 1 + 2.0;",
    );
    // 1 + 2.0 is double, not float: narrowing is rejected.
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        result.errors[0],
        SemanticError::TypeMismatch { .. }
    ));
}

#[test]
fn condition_must_be_boolean() {
    assert!(matches!(
        first_error("if (1) { print(1); }"),
        SemanticError::ConditionType { found: Ty::Int, .. }
    ));
    assert!(matches!(
        first_error("while (\"s\") { }"),
        SemanticError::ConditionType { .. }
    ));
}

#[test]
fn return_type_checking() {
    assert!(matches!(
        first_error("int f() { return \"no\"; }"),
        SemanticError::ReturnTypeMismatch { .. }
    ));
    assert!(matches!(
        first_error("int f() { return; }"),
        SemanticError::ReturnTypeMismatch { .. }
    ));
    assert!(matches!(
        first_error("void f() { return 1; }"),
        SemanticError::ReturnTypeMismatch { .. }
    ));
    assert!(check("void f() { return; }").ok());
    assert!(check("double f() { return 1; }").ok(), "widening return");
}

#[test]
fn return_outside_method() {
    assert!(matches!(
        first_error("return 1;"),
        SemanticError::ReturnOutsideMethod { .. }
    ));
}

#[test]
fn call_arity_and_argument_types() {
    let source = "int add(int a, int b) { return a + b; }";
    assert!(matches!(
        first_error(&format!("{source} int r = add(1);")),
        SemanticError::ArityMismatch { expected: 2, found: 1, .. }
    ));
    assert!(matches!(
        first_error(&format!("{source} int r = add(1, \"two\");")),
        SemanticError::ArgumentTypeMismatch { index: 1, .. }
    ));
    assert!(check(&format!("{source} int r = add(1, 2);")).ok());
}

#[test]
fn calling_a_variable_is_not_callable() {
    assert!(matches!(
        first_error("int x = 1; x(2);"),
        SemanticError::NotCallable { .. }
    ));
}

#[test]
fn member_access_on_non_class() {
    assert!(matches!(
        first_error("int x = 1; int y = x.field;"),
        SemanticError::MemberAccessOnNonClass { .. }
    ));
}

#[test]
fn unknown_member() {
    assert!(matches!(
        first_error("class P { int x; } P p = new P(); int y = p.z;"),
        SemanticError::UnknownMember { member, .. } if member == "z"
    ));
}

#[test]
fn unknown_class_in_new() {
    assert!(matches!(
        first_error("Ghost g = new Ghost();"),
        // The declaration's type fails first; `new` fails second.
        SemanticError::UndefinedType { .. }
    ));
    let result = check("Ghost g = new Ghost();");
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, SemanticError::UnknownClass { .. })));
}

#[test]
fn print_requires_printable() {
    assert!(matches!(
        first_error("class P { int x; } P p = new P(); print(p);"),
        SemanticError::NotPrintable { .. }
    ));
    assert!(check("print(1); print(2.5); print(true); print(\"s\"); print(null);").ok());
}

#[test]
fn int_literal_out_of_range() {
    assert!(matches!(
        first_error("int big = 2147483648;"),
        SemanticError::IntLiteralOutOfRange { .. }
    ));
    assert!(check("int max = 2147483647;").ok());
}

#[test]
fn for_in_is_rejected() {
    let result = check("int xs = 1; for (int x in xs) { print(x); }");
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, SemanticError::ForInUnsupported { .. })));
}

// ── Warnings ───────────────────────────────────────────────────────────

#[test]
fn uninitialized_non_boolean_warns() {
    let result = check("int x;");
    assert!(result.ok(), "a warning is not an error");
    assert!(matches!(
        &result.warnings[0],
        SemanticWarning::UninitializedVariable { name, .. } if name == "x"
    ));
}

#[test]
fn uninitialized_boolean_does_not_warn() {
    let result = check("boolean flag;");
    assert!(result.ok());
    assert!(result.warnings.is_empty());
}

// ── Error containment ──────────────────────────────────────────────────

#[test]
fn one_failure_does_not_cascade() {
    // `missing` is undefined; everything containing it stays quiet.
    let result = check("int x = missing + 1 * 2;");
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(
        result.errors[0],
        SemanticError::UndefinedIdentifier { .. }
    ));
}

#[test]
fn every_expression_is_typed_or_diagnosed() {
    let source = "int x = missing + 1;";
    let parsed = parse(source);
    let result = analyze(&parsed.unit);
    let Stmt::VarDecl {
        init: Some(init), ..
    } = &parsed.unit.stmts[0]
    else {
        panic!("expected declaration");
    };
    // The containing expression typed as Error, with exactly one error.
    assert_eq!(result.ty_of(init.id), Ty::Error);
    assert_eq!(result.errors.len(), 1);
}

// ── Scoping ────────────────────────────────────────────────────────────

#[test]
fn shadowing_in_inner_scope_is_allowed() {
    let result = check("int x = 1; { String x = \"s\"; print(x); } print(x);");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn inner_scope_names_do_not_leak() {
    assert!(matches!(
        first_error("{ int inner = 1; } print(inner);"),
        SemanticError::UndefinedIdentifier { name, .. } if name == "inner"
    ));
}

#[test]
fn method_parameters_are_scoped_to_the_body() {
    assert!(matches!(
        first_error("void f(int a) { } print(a);"),
        SemanticError::UndefinedIdentifier { name, .. } if name == "a"
    ));
}

#[test]
fn duplicate_parameter_names_are_rejected() {
    assert!(matches!(
        first_error("void f(int a, int a) { }"),
        SemanticError::DuplicateDefinition { name, .. } if name == "a"
    ));
}

#[test]
fn fields_are_visible_inside_methods() {
    let result = check("class C { int n; int get() { return n; } }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn scope_depth_returns_to_global() {
    let result = check("class C { void m() { { int x = 1; } } } int y = 2;");
    assert!(result.ok(), "errors: {:?}", result.errors);
    assert_eq!(result.table.depth(), 1);
}
