//! regvm - teaching register machine
//! Command-line interface for running, tracing and checking programs

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::*;
use regvm_core::{
    LabelMode, Opcode, OpcodeCategory, Severity, VmError, check_program, is_clean,
};
use regvm_runtime::{FileLoader, RunReport, Runtime, RuntimeConfig, RuntimeError, TraceFormat};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "regvm")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version)]
#[command(about = "regvm - a teaching register machine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Register labels in a single pass (forward branches fault)
    #[arg(long, global = true)]
    legacy_labels: bool,

    /// Abort after N loop iterations
    #[arg(long, global = true, value_name = "N")]
    max_steps: Option<u64>,

    /// Config file (defaults to ./regvm.toml when present)
    #[arg(long, global = true, value_name = "PATH", env = "REGVM_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program and print the final machine state
    Run {
        /// Program file; asked for on stdin when omitted
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Print load/run progress
        #[arg(short, long)]
        debug: bool,
    },

    /// Check a program without running it
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Run a program printing the machine state after every instruction
    Trace {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = TraceArg::Classic)]
        format: TraceArg,
    },

    /// Show the instruction set
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TraceArg {
    Classic,
    Json,
}

impl From<TraceArg> for TraceFormat {
    fn from(arg: TraceArg) -> Self {
        match arg {
            TraceArg::Classic => TraceFormat::Classic,
            TraceArg::Json => TraceFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Run { file, debug } => run_command(&cli, file.as_deref(), *debug),
        Commands::Check { file } => check_command(&cli, file),
        Commands::Trace { file, format } => trace_command(&cli, file, *format),
        Commands::Info => {
            print_info();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| "regvm=warn".into()),
        1 => "regvm=debug".into(),
        _ => "regvm=trace".into(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Defaults < config file < REGVM_* environment < command-line flags
fn build_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if cli.legacy_labels {
        config.interpreter.label_mode = LabelMode::Legacy;
    }
    if let Some(max) = cli.max_steps {
        config.interpreter.max_steps = (max > 0).then_some(max);
    }

    tracing::debug!(?config, "configuration resolved");
    Ok(config)
}

fn prompt_file_name() -> Result<PathBuf> {
    print!("Enter file name: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading file name")?;
    let name = line.trim();
    if name.is_empty() {
        bail!("no file name given");
    }
    Ok(PathBuf::from(name))
}

fn run_command(cli: &Cli, file: Option<&Path>, debug: bool) -> Result<()> {
    let file = match file {
        Some(file) => file.to_path_buf(),
        None => prompt_file_name()?,
    };

    let config = build_config(cli)?.with_debug(debug);
    let mode = config.interpreter.label_mode;

    println!(
        "{} {} ({} labels)",
        "     Running".green().bold(),
        file.display().to_string().cyan(),
        mode
    );

    let mut runtime = Runtime::new(config);
    let report = match runtime.run_file(&file) {
        Ok(report) => report,
        Err(RuntimeError::Fault(fault)) => {
            print_fault_state(&fault);
            return Err(RuntimeError::Fault(fault))
                .with_context(|| format!("running {}", file.display()));
        }
        Err(e) => return Err(e).with_context(|| format!("running {}", file.display())),
    };

    println!(
        "{} {} instructions, {}",
        "    Finished".green().bold(),
        report.instructions,
        if report.halted { "halted" } else { "reached end of program" }
    );
    print_state(&report);

    Ok(())
}

fn trace_command(cli: &Cli, file: &Path, format: TraceArg) -> Result<()> {
    let config = build_config(cli)?.with_trace(format.into());

    let mut runtime = Runtime::new(config);
    let report = runtime
        .run_file(file)
        .with_context(|| format!("tracing {}", file.display()))?;

    // stdout carries the trace; the summary goes to stderr
    eprintln!(
        "{} {} instructions in {} steps",
        "    Finished".green().bold(),
        report.instructions,
        report.steps
    );

    Ok(())
}

fn check_command(cli: &Cli, file: &Path) -> Result<()> {
    let config = build_config(cli)?;
    let program = FileLoader::load_path(file)?;

    println!(
        "{} {}",
        "Checking".green().bold(),
        file.display().to_string().cyan()
    );

    let diagnostics = check_program(&program, config.interpreter.label_mode);
    for diag in &diagnostics {
        let severity = match diag.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!("  line {}: {}: {}", diag.line + 1, severity, diag.message);
        if let Some(text) = program.line(diag.line) {
            println!("      {}", text.trim().dimmed());
        }
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if !is_clean(&diagnostics) {
        bail!("{errors} error(s) found in {}", file.display());
    }

    println!(
        "{} No errors found ({} warning(s))",
        "    Finished".green().bold(),
        diagnostics.len()
    );

    Ok(())
}

fn print_state(report: &RunReport) {
    println!("\n{}", "Registers:".bold());
    for (i, value) in report.registers.iter().enumerate() {
        let text = format!("R{i:<2} {value}");
        if *value != 0 {
            println!("  {}", text.cyan());
        } else {
            println!("  {}", text.dimmed());
        }
    }

    println!("\n{}", "Memory:".bold());
    let used: Vec<_> = report.used_memory().collect();
    if used.is_empty() {
        println!("  {}", "(all zero)".dimmed());
    }
    for (addr, value) in used {
        println!("  [{addr:>2}] {value}");
    }
}

fn print_fault_state(fault: &VmError) {
    eprintln!("\n{}", "State at fault:".bold());
    let registers: Vec<String> = fault
        .registers
        .iter()
        .enumerate()
        .map(|(i, r)| format!("R{i}={r}"))
        .collect();
    eprintln!("  {}", registers.join(" "));
    let memory: Vec<String> = fault
        .memory
        .iter()
        .enumerate()
        .filter(|(_, m)| **m != 0)
        .map(|(i, m)| format!("[{i}]={m}"))
        .collect();
    if !memory.is_empty() {
        eprintln!("  {}", memory.join(" "));
    }
}

fn print_info() {
    println!("{}", "regvm - a teaching register machine".bold());
    println!();
    println!("13 registers (R0-R12), 20 memory cells (0-19), one comparison latch.");
    println!("Words are 64-bit signed integers; arithmetic wraps.");
    println!();

    for category in [
        OpcodeCategory::Memory,
        OpcodeCategory::Arithmetic,
        OpcodeCategory::Logic,
        OpcodeCategory::Shift,
        OpcodeCategory::Control,
    ] {
        println!("{}", format!("{category:?}:").bold());
        for op in Opcode::ALL.iter().filter(|op| op.category() == category) {
            println!("  {}", op.summary());
        }
        println!();
    }

    println!("{}", "Syntax:".bold());
    println!("  #5, #-3        immediate");
    println!("  R0 .. R12      register");
    println!("  [#4], [R1]     memory address (brackets optional)");
    println!("  LOOP:          label");
    println!("  // text        comment");
    println!();
    println!("{}", "Commands:".bold());
    println!("  regvm run program.txt                 # Run and print final state");
    println!("  regvm run                             # Ask for the file name");
    println!("  regvm trace program.txt               # State after every instruction");
    println!("  regvm trace program.txt -f json       # Same, as JSON Lines");
    println!("  regvm check program.txt               # Static check only");
    println!("  regvm --legacy-labels run prog.txt    # Single-pass labels");
    println!("  regvm --max-steps 1000 run prog.txt   # Abort runaway loops");
}
