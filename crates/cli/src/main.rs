use anyhow::Result;
use clap::{Parser, Subcommand};
use console::{style, Term};
use dsh_core::{
    enter, generate_env_script, materialize, LocalStore, Materialized, Shell, ShellSpec,
};
use dsh_platform::{expand_path, PlatformInfo};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Helper to convert CoreError to anyhow::Error (works around mlua not being Send+Sync)
fn map_core_err<T>(result: dsh_core::Result<T>) -> Result<T> {
    result.map_err(|e| anyhow::anyhow!("{}", e))
}

/// dsh - declarative development shells
#[derive(Parser)]
#[command(name = "dsh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Package store root (overrides DSH_STORE and the default location)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter the development shell described by a descriptor file
    Enter {
        /// Path to the descriptor file (default: shell.lua)
        #[arg(default_value = "shell.lua")]
        config: PathBuf,
    },

    /// Show what would be resolved and exported (dry-run)
    Resolve {
        /// Path to the descriptor file (default: shell.lua)
        #[arg(default_value = "shell.lua")]
        config: PathBuf,
    },

    /// Print the environment as an export script
    PrintEnv {
        /// Path to the descriptor file (default: shell.lua)
        #[arg(default_value = "shell.lua")]
        config: PathBuf,

        /// Shell to generate the script for (auto-detected if not specified)
        #[arg(short, long)]
        shell: Option<String>,
    },

    /// Show platform and store information
    Status,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Enter { config } => cmd_enter(&config, cli.store),
        Commands::Resolve { config } => cmd_resolve(&config, cli.store, cli.verbose),
        Commands::PrintEnv { config, shell } => cmd_print_env(&config, cli.store, shell),
        Commands::Status => cmd_status(cli.store),
    }
}

fn open_store(store: Option<PathBuf>) -> Result<LocalStore> {
    match store {
        Some(root) => {
            let root = expand_path(root)?;
            debug!("Using store at {}", root.display());
            Ok(LocalStore::new(root))
        }
        None => map_core_err(LocalStore::open_default()),
    }
}

fn load_materialized(config: &Path, store: Option<PathBuf>) -> Result<Materialized> {
    let term = Term::stderr();

    let config = expand_path(config)?;
    if !config.exists() {
        term.write_line(&format!(
            "{} Descriptor not found: {}",
            style("error:").red().bold(),
            config.display()
        ))?;
        std::process::exit(1);
    }

    let spec: ShellSpec = match dsh_lua_evaluate(&config) {
        Ok(s) => s,
        Err(e) => {
            term.write_line(&format!(
                "{} Failed to evaluate descriptor: {}",
                style("error:").red().bold(),
                e
            ))?;
            std::process::exit(1);
        }
    };

    let store = open_store(store)?;
    map_core_err(materialize(&spec, &store))
}

// Keeps the mlua error out of the anyhow chain (not Send+Sync)
fn dsh_lua_evaluate(config: &Path) -> Result<ShellSpec, String> {
    dsh_core::evaluate_config(config).map_err(|e| e.to_string())
}

fn cmd_enter(config: &Path, store: Option<PathBuf>) -> Result<()> {
    let term = Term::stderr();

    term.write_line(&format!(
        "{} Evaluating {}",
        style("::").cyan().bold(),
        config.display()
    ))?;

    let materialized = load_materialized(config, store)?;

    term.write_line(&format!(
        "{} {} package(s), {} variable(s)",
        style("::").cyan().bold(),
        materialized.packages.len(),
        materialized.exports.len()
    ))?;

    // Only returns on failure
    let err = match enter(&materialized) {
        Err(e) => e,
        Ok(never) => match never {},
    };

    term.write_line(&format!("{} {}", style("error:").red().bold(), err))?;
    std::process::exit(1);
}

fn cmd_resolve(config: &Path, store: Option<PathBuf>, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    term.write_line(&format!(
        "{} Evaluating {}",
        style("::").cyan().bold(),
        config.display()
    ))?;

    let materialized = load_materialized(config, store)?;

    term.write_line("")?;
    for pkg in &materialized.packages {
        term.write_line(&format!(
            "  {} {} {}",
            style("+").green().bold(),
            pkg.name,
            style(format!("({})", pkg.root.display())).dim()
        ))?;
    }

    for (name, value) in &materialized.exports {
        if verbose {
            term.write_line(&format!(
                "  {} {} = {}",
                style("~").yellow().bold(),
                name,
                style(value).dim()
            ))?;
        } else {
            term.write_line(&format!("  {} {}", style("~").yellow().bold(), name))?;
        }
    }

    term.write_line("")?;
    term.write_line(&format!(
        "{} Would exec: {}",
        style("::").cyan().bold(),
        dsh_core::exec_command(&materialized)
    ))?;

    Ok(())
}

fn cmd_print_env(config: &Path, store: Option<PathBuf>, shell_name: Option<String>) -> Result<()> {
    let term = Term::stderr();

    let shell = match shell_name {
        Some(name) => match Shell::from_name(&name) {
            Some(shell) => shell,
            None => {
                term.write_line(&format!(
                    "{} Unknown shell: {}. Supported: bash, zsh, fish, sh, powershell",
                    style("error:").red().bold(),
                    name
                ))?;
                std::process::exit(1);
            }
        },
        None => Shell::detect(),
    };

    let materialized = load_materialized(config, store)?;

    let script = generate_env_script(&materialized, &shell);
    println!("{}", script);

    Ok(())
}

fn cmd_status(store: Option<PathBuf>) -> Result<()> {
    let term = Term::stderr();
    let info = PlatformInfo::current();
    let store = open_store(store)?;

    term.write_line(&format!(
        "{} dsh v{}",
        style("::").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    ))?;
    term.write_line("")?;
    term.write_line(&format!("  Platform: {}", info.platform))?;
    term.write_line(&format!("  OS:       {}", info.os.as_str()))?;
    term.write_line(&format!("  Arch:     {}", info.arch.as_str()))?;
    term.write_line(&format!("  User:     {}", info.username))?;
    term.write_line(&format!("  Hostname: {}", info.hostname))?;
    term.write_line(&format!("  Shell:    {}", Shell::detect()))?;
    term.write_line(&format!("  Store:    {}", store.root().display()))?;

    Ok(())
}
