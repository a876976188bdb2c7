//! Ariadne-based rendering for semantic diagnostics.
//!
//! Every error kind has a stable code. Output is colorless so snapshots
//! and golden tests stay byte-stable across terminals.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use sigma_common::span::Span;

use crate::error::{SemanticError, SemanticWarning};

/// Stable code for each error kind.
pub fn error_code(error: &SemanticError) -> &'static str {
    match error {
        SemanticError::DuplicateDefinition { .. } => "E0001",
        SemanticError::UndefinedIdentifier { .. } => "E0002",
        SemanticError::UndefinedType { .. } => "E0003",
        SemanticError::TypeMismatch { .. } => "E0004",
        SemanticError::ConstantWithoutInitializer { .. } => "E0005",
        SemanticError::ConstantReassignment { .. } => "E0006",
        SemanticError::NotAssignable { .. } => "E0007",
        SemanticError::InvalidOperation { .. } => "E0008",
        SemanticError::ConditionType { .. } => "E0009",
        SemanticError::ReturnTypeMismatch { .. } => "E0010",
        SemanticError::ReturnOutsideMethod { .. } => "E0011",
        SemanticError::ArityMismatch { .. } => "E0012",
        SemanticError::ArgumentTypeMismatch { .. } => "E0013",
        SemanticError::NotCallable { .. } => "E0014",
        SemanticError::MemberAccessOnNonClass { .. } => "E0015",
        SemanticError::UnknownMember { .. } => "E0016",
        SemanticError::UnknownClass { .. } => "E0017",
        SemanticError::NotPrintable { .. } => "E0018",
        SemanticError::IntLiteralOutOfRange { .. } => "E0019",
        SemanticError::ForInUnsupported { .. } => "E0020",
    }
}

/// Stable code for each warning kind.
pub fn warning_code(warning: &SemanticWarning) -> &'static str {
    match warning {
        SemanticWarning::UninitializedVariable { .. } => "W0001",
    }
}

/// Clamp a span to valid, non-empty bounds within the source.
fn clamp(span: Span, source_len: usize) -> Range<usize> {
    let s = (span.start as usize).min(source_len);
    let e = (span.end as usize).min(source_len).max(s);
    if s == e {
        s..e.saturating_add(1).min(source_len).max(s)
    } else {
        s..e
    }
}

/// The label message shown under the primary span.
fn primary_label(error: &SemanticError) -> String {
    match error {
        SemanticError::DuplicateDefinition { name, .. } => {
            format!("`{name}` redefined here")
        }
        SemanticError::UndefinedIdentifier { .. } => "not found in this scope".to_string(),
        SemanticError::UndefinedType { .. } => "not a known type".to_string(),
        SemanticError::TypeMismatch {
            expected, found, ..
        } => format!("expected `{expected}`, found `{found}`"),
        SemanticError::ConstantWithoutInitializer { .. } => {
            "missing `= <value>`".to_string()
        }
        SemanticError::ConstantReassignment { name, .. } => {
            format!("`{name}` is `final`")
        }
        SemanticError::NotAssignable { .. } => "not a variable".to_string(),
        SemanticError::InvalidOperation { op, .. } => {
            format!("`{op}` is not defined for these operands")
        }
        SemanticError::ConditionType { found, .. } => {
            format!("this is `{found}`, not `boolean`")
        }
        SemanticError::ReturnTypeMismatch {
            expected, found, ..
        } => format!("expected `{expected}`, found `{found}`"),
        SemanticError::ReturnOutsideMethod { .. } => {
            "no enclosing method".to_string()
        }
        SemanticError::ArityMismatch { expected, .. } => {
            format!("expected {expected} argument(s)")
        }
        SemanticError::ArgumentTypeMismatch {
            expected, found, ..
        } => format!("expected `{expected}`, found `{found}`"),
        SemanticError::NotCallable { .. } => "not a method".to_string(),
        SemanticError::MemberAccessOnNonClass { ty, .. } => {
            format!("`{ty}` has no members")
        }
        SemanticError::UnknownMember { member, .. } => {
            format!("no member `{member}`")
        }
        SemanticError::UnknownClass { .. } => "not a registered class".to_string(),
        SemanticError::NotPrintable { ty, .. } => {
            format!("`{ty}` has no text representation")
        }
        SemanticError::IntLiteralOutOfRange { .. } => {
            "does not fit in 32 bits".to_string()
        }
        SemanticError::ForInUnsupported { .. } => "unsupported statement".to_string(),
    }
}

/// Optional help text, when a plausible fix exists.
fn help_text(error: &SemanticError) -> Option<String> {
    match error {
        SemanticError::TypeMismatch {
            expected, found, ..
        } if expected.is_numeric() && found.is_numeric() => {
            Some("numeric narrowing is never implicit".to_string())
        }
        SemanticError::ConstantWithoutInitializer { .. } => {
            Some("`final` declarations must be initialized where they are declared".to_string())
        }
        SemanticError::NotPrintable { .. } => {
            Some("only primitives, String, and null can be printed".to_string())
        }
        SemanticError::InvalidOperation { op, .. } if op == "%" => {
            Some("`%` requires both operands to be `int`".to_string())
        }
        SemanticError::ForInUnsupported { .. } => {
            Some("rewrite the loop with `while`".to_string())
        }
        _ => None,
    }
}

/// Render a semantic error into a formatted diagnostic string.
pub fn render_error(error: &SemanticError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let span = clamp(error.span(), source.len());
    let code = error_code(error);

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(error.to_string())
        .with_config(config);

    builder.add_label(
        Label::new(span)
            .with_message(primary_label(error))
            .with_color(Color::Red),
    );

    // Duplicate definitions and constant reassignments show the original
    // definition site as a secondary label.
    match error {
        SemanticError::DuplicateDefinition { previous, .. } => {
            builder.add_label(
                Label::new(clamp(*previous, source.len()))
                    .with_message("first defined here")
                    .with_color(Color::Blue),
            );
        }
        SemanticError::ConstantReassignment { defined, .. } => {
            builder.add_label(
                Label::new(clamp(*defined, source.len()))
                    .with_message("declared `final` here")
                    .with_color(Color::Blue),
            );
        }
        _ => {}
    }

    if let Some(help) = help_text(error) {
        builder.set_help(help);
    }

    write_report(builder.finish(), source)
}

/// Render a semantic warning into a formatted diagnostic string.
pub fn render_warning(warning: &SemanticWarning, source: &str) -> String {
    let config = Config::default().with_color(false);
    let span = clamp(warning.span(), source.len());

    let report = Report::build(ReportKind::Warning, span.clone())
        .with_code(warning_code(warning))
        .with_message(warning.to_string())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message("declared without a value")
                .with_color(Color::Yellow),
        )
        .finish();

    write_report(report, source)
}

fn write_report(report: Report<'_, Range<usize>>, source: &str) -> String {
    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Ty;

    #[test]
    fn every_error_code_is_unique() {
        let span = Span::point(0);
        let samples = vec![
            SemanticError::DuplicateDefinition {
                name: "x".into(),
                span,
                previous: span,
            },
            SemanticError::UndefinedIdentifier {
                name: "x".into(),
                span,
            },
            SemanticError::UndefinedType {
                name: "T".into(),
                span,
            },
            SemanticError::TypeMismatch {
                expected: Ty::Int,
                found: Ty::Str,
                span,
            },
            SemanticError::ConstantWithoutInitializer {
                name: "K".into(),
                span,
            },
            SemanticError::ConstantReassignment {
                name: "K".into(),
                span,
                defined: span,
            },
            SemanticError::NotAssignable {
                name: "f".into(),
                span,
            },
            SemanticError::InvalidOperation {
                op: "+".into(),
                lhs: Ty::Boolean,
                rhs: Some(Ty::Int),
                span,
            },
            SemanticError::ConditionType {
                found: Ty::Int,
                span,
            },
            SemanticError::ReturnTypeMismatch {
                expected: Ty::Int,
                found: Ty::Str,
                span,
            },
            SemanticError::ReturnOutsideMethod { span },
            SemanticError::ArityMismatch {
                name: "f".into(),
                expected: 1,
                found: 2,
                span,
            },
            SemanticError::ArgumentTypeMismatch {
                name: "f".into(),
                index: 0,
                expected: Ty::Int,
                found: Ty::Str,
                span,
            },
            SemanticError::NotCallable {
                what: "x".into(),
                span,
            },
            SemanticError::MemberAccessOnNonClass {
                ty: Ty::Int,
                member: "x".into(),
                span,
            },
            SemanticError::UnknownMember {
                class_name: "C".into(),
                member: "x".into(),
                span,
            },
            SemanticError::UnknownClass {
                name: "C".into(),
                span,
            },
            SemanticError::NotPrintable {
                ty: Ty::Class("C".into()),
                span,
            },
            SemanticError::IntLiteralOutOfRange {
                value: 1 << 40,
                span,
            },
            SemanticError::ForInUnsupported { span },
        ];

        let mut codes: Vec<_> = samples.iter().map(error_code).collect();
        codes.sort();
        let before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), before, "error codes must be unique");
    }

    #[test]
    fn rendered_error_includes_code_and_message() {
        let source = "int x = \"hi\";";
        let error = SemanticError::TypeMismatch {
            expected: Ty::Int,
            found: Ty::Str,
            span: Span::new(8, 12),
        };
        let rendered = render_error(&error, source);
        assert!(rendered.contains("E0004"), "rendered: {rendered}");
        assert!(
            rendered.contains("expected `int`, found `String`"),
            "rendered: {rendered}"
        );
    }

    #[test]
    fn rendered_warning_includes_code() {
        let source = "int x;";
        let warning = SemanticWarning::UninitializedVariable {
            name: "x".into(),
            ty: Ty::Int,
            span: Span::new(0, 6),
        };
        let rendered = render_warning(&warning, source);
        assert!(rendered.contains("W0001"), "rendered: {rendered}");
    }

    #[test]
    fn clamp_handles_out_of_bounds_spans() {
        assert_eq!(clamp(Span::new(5, 50), 10), 5..10);
        assert_eq!(clamp(Span::new(3, 3), 10), 3..4);
        assert_eq!(clamp(Span::new(10, 10), 10), 10..10);
    }
}
