//! The Sigma compiler driver.
//!
//! Orchestrates the pipeline: lex + parse, optional script wrapping,
//! semantic analysis, RPN generation. Diagnostics from every phase are
//! collected into one result that names the phase that failed; parser
//! hints ("Did you mean ...") are classified as warnings and do not fail
//! the build.

use std::io;
use std::path::Path;

use sigma_analysis::diagnostics::{render_error, render_warning};
use sigma_analysis::{analyze, wrap_script};
use sigma_common::span::{SourceMap, Span};
use sigma_parser::parse;
use sigma_rpn::{generate, Program};

/// The pipeline phase a diagnostic belongs to (and, for errors, the phase
/// that failed the build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lex,
    Parse,
    Semantic,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Lex => write!(f, "lexical analysis"),
            Phase::Parse => write!(f, "parsing"),
            Phase::Semantic => write!(f, "semantic analysis"),
        }
    }
}

/// One driver-level diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub span: Span,
    /// Full source-annotated rendering, when the phase produces one.
    pub rendered: Option<String>,
}

impl Diagnostic {
    /// Render as `line L:C: message`.
    pub fn format(&self, map: &SourceMap) -> String {
        map.describe(self.span, &self.message)
    }
}

/// Driver options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Lift loose top-level statements into `Script.run()` before
    /// analysis.
    pub wrap_script: bool,
}

/// The result of a compilation attempt.
pub struct CompileResult {
    /// The lowered program; `None` when any phase failed.
    pub program: Option<Program>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub failed_phase: Option<Phase>,
}

impl CompileResult {
    pub fn ok(&self) -> bool {
        self.failed_phase.is_none()
    }

    /// Every error as `line L:C: message`, in source order.
    pub fn formatted_errors(&self, source: &str) -> Vec<String> {
        let map = SourceMap::new(source);
        self.errors.iter().map(|d| d.format(&map)).collect()
    }

    /// Every warning as `line L:C: message`, in source order.
    pub fn formatted_warnings(&self, source: &str) -> Vec<String> {
        let map = SourceMap::new(source);
        self.warnings.iter().map(|d| d.format(&map)).collect()
    }
}

/// Compile Sigma source text.
pub fn compile(source: &str, options: &Options) -> CompileResult {
    let parsed = parse(source);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let lex_failed = parsed.lex_error.is_some();
    for (index, error) in parsed.errors.iter().enumerate() {
        let phase = if lex_failed && index == 0 {
            Phase::Lex
        } else {
            Phase::Parse
        };
        let diagnostic = Diagnostic {
            phase,
            message: error.message.clone(),
            span: error.span,
            rendered: None,
        };
        if error.is_hint() {
            warnings.push(diagnostic);
        } else {
            errors.push(diagnostic);
        }
    }

    if !errors.is_empty() {
        let failed = if lex_failed { Phase::Lex } else { Phase::Parse };
        return CompileResult {
            program: None,
            errors,
            warnings,
            failed_phase: Some(failed),
        };
    }

    let unit = if options.wrap_script {
        wrap_script(parsed.unit)
    } else {
        parsed.unit
    };

    let semantic = analyze(&unit);
    for warning in &semantic.warnings {
        warnings.push(Diagnostic {
            phase: Phase::Semantic,
            message: warning.to_string(),
            span: warning.span(),
            rendered: Some(render_warning(warning, source)),
        });
    }
    if !semantic.ok() {
        errors.extend(semantic.errors.iter().map(|error| Diagnostic {
            phase: Phase::Semantic,
            message: error.to_string(),
            span: error.span(),
            rendered: Some(render_error(error, source)),
        }));
        return CompileResult {
            program: None,
            errors,
            warnings,
            failed_phase: Some(Phase::Semantic),
        };
    }

    let program = generate(&unit, &semantic);
    CompileResult {
        program: Some(program),
        errors,
        warnings,
        failed_phase: None,
    }
}

/// Read a file and compile it.
pub fn compile_file(path: &Path, options: &Options) -> io::Result<(String, CompileResult)> {
    let source = std::fs::read_to_string(path)?;
    let result = compile(&source, options);
    Ok((source, result))
}
