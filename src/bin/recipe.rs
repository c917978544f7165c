//! Recipe CLI - run install recipes on this machine
//!
//! Usage:
//!   recipe run <file>              Execute a recipe
//!   recipe resolve <text>          Expand placeholders in a parameter
//!   recipe constants               Show named constants and their values
//!   recipe children <file>         Show the step tree of a recipe

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_installer::core::lock::RunLock;
use recipe_installer::handlers::DownloadHandler;
use recipe_installer::{
    Arch, ConsoleReporter, Frame, InstallerConfig, MemoryReporter, Operation, OsFamily, Program,
    Reporter, Runtime, StepNode, ValueStack, output, recipe_file,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "recipe")]
#[command(about = "Stack-based install recipe executor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the user config)
    #[arg(short, long, global = true, env = "RECIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the software mirror
    #[arg(long, global = true)]
    mirror: Option<String>,

    /// Target OS family instead of the detected one
    #[arg(long, global = true)]
    os_family: Option<OsFamily>,

    /// Target architecture instead of the detected one
    #[arg(long, global = true)]
    arch: Option<Arch>,

    /// Machine id instead of the detected one
    #[arg(long, global = true)]
    machine_id: Option<Uuid>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a recipe file
    Run {
        /// Path to a .toml or .json recipe
        file: PathBuf,

        /// Starting parameter, replacing the one in the recipe
        #[arg(short, long)]
        param: Option<String>,

        /// Tag prepended to every reported step
        #[arg(short, long)]
        tag: Option<String>,

        /// Print step reports as JSON instead of console lines
        #[arg(long)]
        json: bool,
    },

    /// Expand placeholders in a parameter
    Resolve {
        /// Parameter text, e.g. "{{DESKTOP}}setup.exe"
        text: String,

        /// Value on top of the stack, reachable as {{0}}
        #[arg(short, long)]
        param: Option<String>,
    },

    /// Show named constants for this machine
    Constants,

    /// Show the step tree of a recipe
    Children {
        /// Path to a .toml or .json recipe
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "recipe_installer=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Run {
            file,
            param,
            tag,
            json,
        } => run_recipe(&config, &file, param, tag, json),

        Commands::Resolve { text, param } => {
            let runtime = Runtime::from_config(&config)?;
            let mut stack = ValueStack::new();
            if let Some(param) = param {
                stack.push(Frame::new(param));
            }
            let resolved = runtime.resolver().resolve(&text, &stack)?;
            println!("{}", resolved);
            Ok(())
        }

        Commands::Constants => {
            let runtime = Runtime::from_config(&config)?;
            let constants = runtime.resolver().constants();
            output::info(&format!("Constants for {}:", runtime.facts().os_family()));
            for constant in constants.supported() {
                match constants.resolve(*constant) {
                    Ok(value) => output::pair(constant.as_str(), &value),
                    Err(e) => output::warning(&format!("{}: {}", constant, e)),
                }
            }
            Ok(())
        }

        Commands::Children { file } => {
            let software = recipe_file::load(&file)?;
            output::info(&format!("Steps of {}:", software.label()));
            print_tree(&Program::new(software.steps).into_tree(), 0);
            Ok(())
        }
    }
}

/// Config file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<InstallerConfig> {
    let mut config = InstallerConfig::load(cli.config.as_deref())?;
    if let Some(mirror) = &cli.mirror {
        config.software_mirror = mirror.clone();
    }
    if cli.os_family.is_some() {
        config.os_family = cli.os_family;
    }
    if cli.arch.is_some() {
        config.arch = cli.arch;
    }
    if cli.machine_id.is_some() {
        config.machine_id = cli.machine_id;
    }
    Ok(config)
}

fn run_recipe(
    config: &InstallerConfig,
    file: &Path,
    param: Option<String>,
    tag: Option<String>,
    json: bool,
) -> Result<()> {
    let _lock = RunLock::acquire(file)?;

    let mut software = recipe_file::load(file)?;
    if let Some(param) = param {
        software.parameter = param;
    }

    let mut runtime = Runtime::from_config(config)?;

    if json {
        // stdout carries nothing but the report list
        runtime.registry_mut().register(
            Operation::Download,
            DownloadHandler::from_config(config).quiet(),
        );
        let reporter = MemoryReporter::new();
        let result = execute(&runtime, &software, &reporter);
        let reports = serde_json::to_string_pretty(&reporter.into_reports())
            .context("Failed to serialize step reports")?;
        println!("{}", reports);
        return result;
    }

    output::action(&format!("Installing {}", software.label()));
    let reporter = match tag {
        Some(tag) => ConsoleReporter::tagged(tag),
        None => ConsoleReporter::new(),
    };
    execute(&runtime, &software, &reporter)?;
    output::success(&format!("{} installed", software.label()));
    Ok(())
}

fn execute(
    runtime: &Runtime,
    software: &recipe_installer::SoftwareVersion,
    reporter: &dyn Reporter,
) -> Result<()> {
    runtime
        .installer(software, reporter)?
        .execute()
        .with_context(|| format!("Failed to install {}", software.label()))
}

fn print_tree(nodes: &[StepNode], depth: usize) {
    for node in nodes {
        output::tree_line(depth, &node.step.to_string());
        print_tree(&node.children, depth + 1);
    }
}
