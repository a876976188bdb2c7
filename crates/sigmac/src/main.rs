//! The Sigma compiler CLI.
//!
//! Provides the `sigmac` command with the following subcommands:
//!
//! - `sigmac build <file>` - Compile a Sigma source file to RPN IR
//! - `sigmac check <file>` - Parse and analyze without emitting IR
//!
//! Options:
//! - `--wrap` - Lift loose top-level statements into `Script.run()`
//! - `--emit` - IR output format (text or json)
//! - `--output` - Output path (defaults to stdout)

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use sigmac::{compile_file, CompileResult, Options, Phase};

#[derive(Parser)]
#[command(name = "sigmac", version, about = "The Sigma compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Sigma source file to RPN IR
    Build {
        /// Path to the Sigma source file
        file: PathBuf,

        /// Lift loose top-level statements into Script.run()
        #[arg(long)]
        wrap: bool,

        /// IR output format
        #[arg(long, value_enum, default_value = "text")]
        emit: Emit,

        /// Output path for the IR (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse and analyze a Sigma source file without emitting IR
    Check {
        /// Path to the Sigma source file
        file: PathBuf,

        /// Lift loose top-level statements into Script.run()
        #[arg(long)]
        wrap: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Build {
            file,
            wrap,
            emit,
            output,
        } => build(&file, wrap, emit, output.as_deref()),
        Commands::Check { file, wrap } => check(&file, wrap),
    };

    if let Err(message) = outcome {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

/// Compile and emit the IR.
fn build(file: &Path, wrap: bool, emit: Emit, output: Option<&Path>) -> Result<(), String> {
    let result = run_pipeline(file, wrap)?;
    let program = result
        .program
        .expect("a successful compilation carries a program");

    let text = match emit {
        Emit::Text => program.to_string(),
        Emit::Json => serde_json::to_string_pretty(&program)
            .map_err(|e| format!("failed to serialize program: {e}"))?,
    };

    match output {
        Some(path) => std::fs::write(path, text)
            .map_err(|e| format!("failed to write '{}': {e}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}

/// Analyze only.
fn check(file: &Path, wrap: bool) -> Result<(), String> {
    let result = run_pipeline(file, wrap)?;
    eprintln!(
        "  OK: {} instruction(s) would be emitted",
        result.program.map(|p| p.len()).unwrap_or(0)
    );
    Ok(())
}

/// Run the compiler on a file and report all diagnostics. Errors out when
/// a phase failed.
fn run_pipeline(file: &Path, wrap: bool) -> Result<CompileResult, String> {
    if !file.exists() {
        return Err(format!("source file '{}' does not exist", file.display()));
    }

    let options = Options { wrap_script: wrap };
    let (source, result) =
        compile_file(file, &options).map_err(|e| format!("failed to read '{}': {e}", file.display()))?;

    report_diagnostics(&source, &result);

    if let Some(phase) = result.failed_phase {
        return Err(format!("compilation failed during {phase}."));
    }
    Ok(result)
}

/// Print every diagnostic: ariadne-rendered where available, inline
/// reports otherwise.
fn report_diagnostics(source: &str, result: &CompileResult) {
    use ariadne::{Label, Report, ReportKind, Source};

    let print_one = |diagnostic: &sigmac::Diagnostic, is_warning: bool| {
        if let Some(rendered) = &diagnostic.rendered {
            eprint!("{rendered}");
            return;
        }
        let start = diagnostic.span.start as usize;
        let end = (diagnostic.span.end as usize).max(start + 1);
        let (kind, headline) = if is_warning {
            (ReportKind::Warning, "Warning")
        } else {
            match diagnostic.phase {
                Phase::Lex => (ReportKind::Error, "Lexical error"),
                Phase::Parse => (ReportKind::Error, "Parse error"),
                Phase::Semantic => (ReportKind::Error, "Semantic error"),
            }
        };
        let _ = Report::<std::ops::Range<usize>>::build(kind, start..end)
            .with_message(headline)
            .with_label(Label::new(start..end).with_message(&diagnostic.message))
            .finish()
            .eprint(Source::from(source));
    };

    for diagnostic in &result.errors {
        print_one(diagnostic, false);
    }
    for diagnostic in &result.warnings {
        print_one(diagnostic, true);
    }
}
