//! basm - CLI Entry Point
//!
//! Commands:
//! - `basm run <program>` - Run a program and print the final registers
//! - `basm check <program>` - Report problems without running
//! - `basm list <program>` - Print the canonical listing
//! - `basm debug <program>` - Interactive debugger

use basm::{EndPolicy, LoadOptions, RunConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "basm")]
#[command(version)]
#[command(about = "An interpreter for a small four-register assembly language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it ends
    Run {
        /// Path to the program source
        program: PathBuf,
        /// Trace label resolution and every dispatched instruction
        #[arg(short, long)]
        verbose: bool,
        /// Print the final state as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Treat running past the last instruction as success
        #[arg(long)]
        lenient_end: bool,
        /// Maximum number of instructions accepted
        #[arg(long, default_value_t = basm::asm::MAX_INSTRUCTIONS)]
        max_instructions: usize,
        /// Stop after this many executed instructions
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Load a program and report every problem found without running it
    Check {
        /// Path to the program source
        program: PathBuf,
    },
    /// Print the program as the interpreter sees it
    List {
        /// Path to the program source
        program: PathBuf,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the program source
        program: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, verbose, json, lenient_end, max_instructions, max_steps }) => {
            let config = RunConfig {
                verbose,
                load: LoadOptions { max_instructions },
                end_policy: if lenient_end { EndPolicy::Lenient } else { EndPolicy::Strict },
                max_steps,
            };
            run_program(&program, &config, json);
        }
        Some(Commands::Check { program }) => {
            check_program(&program);
        }
        Some(Commands::List { program }) => {
            list_program(&program);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        None => {
            println!("basm v{}", env!("CARGO_PKG_VERSION"));
            println!("A four-register assembly interpreter");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Unable to open the file {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_source(path: &Path, source: &str) -> basm::Program {
    match basm::load(source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &Path, config: &RunConfig, json: bool) {
    let source = read_source(path);

    let report = if json {
        basm::execute(&source, config)
    } else {
        println!("━━━ {} ━━━", path.display());
        basm::execute_to(&source, config, &mut std::io::stdout())
    };

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to encode report: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        if let Some(fault) = &report.fault {
            eprintln!("{}", fault);
        }
        println!("━━━ Result ━━━");
        println!("{}", report);
        if report.status == basm::ExitStatus::Running {
            println!("(stopped after {} steps)", report.steps);
        }
        if report.pending_returns > 0 {
            println!("({} return point(s) never reached)", report.pending_returns);
        }
    }

    std::process::exit(report.status.code());
}

fn check_program(path: &Path) {
    let source = read_source(path);
    let program = load_source(path, &source);

    let problems = program.diagnostics();
    if problems.is_empty() {
        println!(
            "✓ {}: {} instructions, {} labels",
            path.display(),
            program.len(),
            program.labels().len()
        );
        return;
    }

    for problem in &problems {
        eprintln!("{}: {}", path.display(), problem);
    }
    std::process::exit(1);
}

fn list_program(path: &Path) {
    let source = read_source(path);
    let program = load_source(path, &source);
    print!("{}", program.listing());
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path) {
    let source = read_source(path);
    let program = load_source(path, &source);

    if let Err(e) = basm::run_debugger(program) {
        eprintln!("Debugger error: {}", e);
        std::process::exit(1);
    }
}
