//! BOOSE interpreter CLI

use boose::canvas::TraceCanvas;
use boose::config::Config;
use boose::diagnostic::{Diagnostic, DiagnosticSink, Severity, TracingSink, render};
use boose::interp::{EvalMode, Interpreter, ScopeMode};
use boose::parser::parse_program;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "boose", version, about = "BOOSE - line-oriented drawing script interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Arithmetic evaluator: legacy or precedence
    #[arg(long, global = true)]
    eval_mode: Option<EvalMode>,

    /// Method call scopes: stack or single-slot
    #[arg(long, global = true)]
    scope_mode: Option<ScopeMode>,

    /// Loop iteration cap
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Log filter (e.g. `debug`, `boose=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a BOOSE program
    Run(RunArgs),
    /// Parse a program and report problems without running it
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Parse and dump the statement tree as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl,
}

#[derive(Args)]
struct RunArgs {
    /// Source file to run
    file: PathBuf,

    /// Also print declaration and assignment echoes
    #[arg(long, short)]
    verbose: bool,

    /// Print the final variables as JSON
    #[arg(long)]
    dump_vars: bool,

    /// Print every canvas operation
    #[arg(long)]
    trace_canvas: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Command::Run(args) => run_file(args, config),
        Command::Check { file } => check_file(file),
        Command::Parse { file } => parse_file(file),
        Command::Repl => start_repl(config),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install a stderr subscriber when `--log` or RUST_LOG asks for one
fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        None => return,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(mode) = cli.eval_mode {
        config.eval_mode = mode;
    }
    if let Some(mode) = cli.scope_mode {
        config.scope_mode = mode;
    }
    if let Some(max) = cli.max_iterations {
        config.max_iterations = max;
    }
    tracing::debug!(?config, "configuration");
    Ok(config)
}

fn run_file(args: &RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(&args.file)?;
    let filename = args.file.display().to_string();

    let mut canvas = TraceCanvas::new(config.canvas.width, config.canvas.height)?;
    let mut interpreter = Interpreter::new(config);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let result = interpreter.run_program(&source, &mut canvas, &mut diagnostics);

    let mut trace = TracingSink;
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Note if args.verbose => println!("{diagnostic}"),
            Severity::Note => trace.report(diagnostic),
            _ => render(&filename, &source, &diagnostic, &mut std::io::stderr())?,
        }
    }
    for text in canvas.written_text() {
        println!("{text}");
    }
    if args.trace_canvas {
        for op in canvas.ops() {
            println!("{op}");
        }
    }
    if args.dump_vars {
        let vars: BTreeMap<_, _> = interpreter.store().variables().iter().collect();
        println!("{}", serde_json::to_string_pretty(&vars)?);
    }

    result?;
    Ok(())
}

fn check_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let parsed = parse_program(&source);
    for diagnostic in &parsed.diagnostics {
        render(&filename, &source, diagnostic, &mut std::io::stderr())?;
    }
    if parsed.has_errors() {
        return Err(format!("{filename} has {} problem(s)", parsed.diagnostics.len()).into());
    }

    println!("✓ {} parses successfully ({} statements)", filename, parsed.program.stmts.len());
    Ok(())
}

fn parse_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let parsed = parse_program(&source);
    for diagnostic in &parsed.diagnostics {
        render(&filename, &source, diagnostic, &mut std::io::stderr())?;
    }
    println!("{}", serde_json::to_string_pretty(&parsed.program)?);
    Ok(())
}

fn start_repl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = boose::repl::Repl::new(config)?;
    repl.run()?;
    Ok(())
}
