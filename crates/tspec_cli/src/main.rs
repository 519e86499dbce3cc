//! tspec: command line front end for the tspec compiler.
//!
//! Usage:
//!   tspec compile <entry> [--output-dir DIR] [--emit NAME]... [--option EMITTER.KEY=VALUE]...
//!                 [--config FILE] [--warn-as-error] [--log-level LEVEL]
//!
//! Exits with 1 when the program has errors.

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, LabeledSpan, MietteDiagnostic, NamedSource, Report};
use std::process;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tspec_compiler::{compile, CompilerHost, CompilerOptions, NodeHost, Program};
use tspec_diagnostics::{Diagnostic, Severity};
use tspec_path::{get_directory_path, join_paths};

const CONFIG_FILE_NAME: &str = "tspconfig.json";

#[derive(ClapParser, Debug)]
#[command(name = "tspec", version, about = "tspec - type checker for TypeSpec-style interface definitions")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log verbosity. `RUST_LOG` takes precedence when set.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a program and report diagnostics.
    Compile(CompileArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Entry file, or a directory containing `main.tsp`.
    #[arg(value_name = "ENTRY")]
    entry: String,

    /// Directory emitters write to.
    #[arg(long)]
    output_dir: Option<String>,

    /// Emitter to run. May be repeated.
    #[arg(long, value_name = "NAME")]
    emit: Vec<String>,

    /// Emitter option. May be repeated.
    #[arg(long = "option", value_name = "EMITTER.KEY=VALUE")]
    options: Vec<String>,

    /// Config file. Defaults to `tspconfig.json` next to the entry, if any.
    #[arg(long)]
    config: Option<String>,

    /// Report warnings as errors.
    #[arg(long)]
    warn_as_error: bool,

    /// Print diagnostics as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// List all files that are part of the compilation.
    #[arg(long)]
    list_files: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let exit_code = match &cli.command {
        Command::Compile(args) => match run_compile(args) {
            Ok(code) => code,
            Err(report) => {
                eprintln!("{:?}", report);
                1
            }
        },
    };
    process::exit(exit_code);
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .init();
}

fn run_compile(args: &CompileArgs) -> miette::Result<i32> {
    let start = Instant::now();
    let host = NodeHost::new();
    let options = build_options(&host, args)?;
    if !options.emit.is_empty() {
        warn!(target: "tspec::cli", emit = ?options.emit, "no emitters are available; skipping emit");
    }

    let program = compile(&host, &args.entry, &options);

    if args.list_files {
        for file in program.source_files() {
            println!("{}", file);
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(program.diagnostics()).into_diagnostic()?;
        println!("{}", json);
    } else {
        for diagnostic in program.diagnostics() {
            eprintln!("{:?}", to_report(&program, diagnostic));
        }
        print_summary(&program);
    }

    info!(target: "tspec::cli", elapsed_ms = start.elapsed().as_millis() as u64, "done");
    Ok(if program.has_error() { 1 } else { 0 })
}

/// Options from the config file, overridden by command line flags.
fn build_options(host: &dyn CompilerHost, args: &CompileArgs) -> miette::Result<CompilerOptions> {
    let entry_dir = match host.stat(&args.entry) {
        Ok(stat) if stat.is_directory => args.entry.clone(),
        _ => get_directory_path(&args.entry),
    };
    let config = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let candidate = join_paths(&entry_dir, &[CONFIG_FILE_NAME]);
            host.stat(&candidate).is_ok_and(|s| s.is_file).then_some(candidate)
        }
    };
    let (base, project_root) = match config {
        Some(path) => (
            CompilerOptions::from_json_file(host, &path).into_diagnostic()?,
            get_directory_path(&path),
        ),
        None => (CompilerOptions::default(), entry_dir),
    };

    let mut overrides = CompilerOptions {
        output_dir: args.output_dir.clone(),
        emit: args.emit.clone(),
        warn_as_error: args.warn_as_error,
        ..Default::default()
    };
    for option in &args.options {
        overrides.apply_emitter_option(option).into_diagnostic()?;
    }
    let mut options = base.merge(overrides);
    options
        .resolve_paths(&project_root, &host.get_execution_root())
        .into_diagnostic()?;
    Ok(options)
}

/// A miette report for one diagnostic, with the source snippet attached
/// when the diagnostic points into a loaded file.
fn to_report(program: &Program, diagnostic: &Diagnostic) -> Report {
    let severity = match diagnostic.severity {
        Severity::Error => miette::Severity::Error,
        Severity::Warning => miette::Severity::Warning,
    };
    let mut rendered = MietteDiagnostic::new(diagnostic.message.clone())
        .with_code(diagnostic.code)
        .with_severity(severity);

    let Some(target) = &diagnostic.target else {
        return Report::new(rendered);
    };
    let Some(text) = program.source_text(&target.file) else {
        return Report::new(rendered);
    };
    let end = (target.end as usize).min(text.len());
    let pos = (target.pos as usize).min(end);
    rendered = rendered.with_label(LabeledSpan::at(pos..end, diagnostic.code));
    Report::new(rendered).with_source_code(NamedSource::new(&target.file, text.to_string()))
}

fn print_summary(program: &Program) {
    let errors = program.diagnostics().iter().filter(|d| d.is_error()).count();
    let warnings = program.diagnostics().len() - errors;
    if errors == 0 && warnings == 0 {
        eprintln!("Compilation completed successfully.");
        return;
    }
    eprintln!(
        "\nFound {} error{}, {} warning{}.",
        errors,
        if errors == 1 { "" } else { "s" },
        warnings,
        if warnings == 1 { "" } else { "s" }
    );
}
