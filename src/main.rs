//! skillgap - skill-gap diagnostics for assessment responses
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use skillgap::cli::{
    DiagnoseCommand, DiagnoseOptions, HealthCommand, HealthOptions, InitCommand, InitOptions,
};
use skillgap::config::{crash_log_path, Config};
use skillgap::error::exit_codes;
use skillgap::logging;

// =============================================================================
// CLI Definition
// =============================================================================

/// skillgap - skill-gap diagnostics for assessment responses
#[derive(Parser)]
#[command(name = "skillgap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose a request (JSON from a file or stdin)
    Diagnose {
        /// Request file (reads stdin when omitted)
        #[arg(long, short)]
        input: Option<PathBuf>,
        /// Maximum objectives/activities in the plan
        #[arg(long, short)]
        max_activities: Option<usize>,
        /// Print the full result envelope as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Report liveness
    Health {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Write the default project configuration
    Init {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Overwrite an existing config file
        #[arg(long, short)]
        force: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("skillgap error: {}", e);
            exit_code(exit_codes::FAILURE)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to `<skillgap_home>/crash.log` and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("skillgap panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let log_handle = logging::init();
    let cwd = std::env::current_dir()?;
    let config = Config::load_from_cwd(&cwd);
    log_handle.apply_config(&config.logging);

    match cli.command {
        Commands::Diagnose {
            input,
            max_activities,
            json,
            quiet,
        } => run_diagnose(
            config,
            DiagnoseOptions {
                json,
                quiet,
                input,
                max_activities,
            },
        ),
        Commands::Health { json } => run_health(json),
        Commands::Init { json, quiet, force } => run_init(json, quiet, force, &cwd),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        exit_code(exit_codes::SUCCESS)
    } else {
        exit_code(exit_codes::FAILURE)
    }
}

fn run_diagnose(
    config: Config,
    options: DiagnoseOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = DiagnoseCommand::new(config);

    let output = cmd.run(&options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        if output.success {
            println!("{}", formatted);
        } else {
            eprint!("{}", formatted);
        }
    }

    Ok(exit_code(output.exit_code()))
}

fn run_health(json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = HealthCommand::new();
    let output = cmd.run();
    print!("{}", cmd.format_output(&output, &HealthOptions { json }));
    if json {
        println!();
    }
    Ok(exit_code(exit_codes::SUCCESS))
}

fn run_init(
    json: bool,
    quiet: bool,
    force: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cmd = InitCommand::new(cwd);
    let options = InitOptions { json, quiet, force };

    let output = cmd.run(&options);
    let formatted = cmd.format_output(&output, &options);

    if !formatted.is_empty() {
        println!("{}", formatted);
    }

    Ok(success_to_exit_code(output.success))
}

// =============================================================================
// Tests
// =============================================================================
