mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liveini_core::Config;
use tracing_subscriber::EnvFilter;

use commands::Target;

#[derive(Parser)]
#[command(name = "liveini")]
#[command(about = "Find and edit the live setting objects of a running game")]
#[command(version)]
struct Cli {
    /// Attach to this process id instead of searching by name
    #[arg(short, long, global = true)]
    pid: Option<u32>,

    /// Config file (defaults to <config dir>/liveini/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Executable name to search for, overriding the config
    #[arg(short, long, global = true)]
    target: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the target and report sections, version, RTTI and settings
    Scan,

    /// List settings matching a query
    Settings {
        /// Case-insensitive regex or substring matched against setting names
        query: Option<String>,

        /// Only keep records with one of these properties
        /// (e.g. float, bool, colorrgb, ini, inipref, gamesetting, changed)
        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,

        /// Drop records with any of these properties
        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Maximum number of rows to print
        #[arg(short, long, default_value = "200")]
        limit: usize,
    },

    /// Write a new value to a setting
    Set {
        /// Setting name, e.g. fFOV:Camera
        name: String,

        /// New value (true/false, number, or r,g,b[,a] for colours)
        value: String,
    },

    /// Write a setting's default or scanned value back to it
    Revert {
        /// Setting name
        name: String,

        /// Restore the default value instead of the scanned one
        #[arg(long)]
        default: bool,
    },

    /// Save matching settings to a delimited text file
    Dump {
        /// Case-insensitive regex or substring matched against setting names
        query: Option<String>,

        /// Output path (defaults to the configured dump path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_delimiter = ',')]
        include: Vec<String>,

        #[arg(short, long, value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// List recovered RTTI classes
    Rtti {
        /// Case-insensitive regex or substring matched against class names
        query: Option<String>,

        /// Write the matching entries to a JSON file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Maximum number of rows to print
        #[arg(short, long, default_value = "200")]
        limit: usize,
    },

    /// Search the code section for a byte pattern (e.g. "48 8B ?5 ?? 90")
    Aob {
        pattern: String,
    },

    /// Find the vtable slots that point at a function
    Method {
        /// Function address (hex) or <exe>+<offset>
        address: String,
    },

    /// Find pointers to an address inside large heap regions
    Heap {
        /// Address to look for (hex)
        address: String,
    },

    /// Keep one session open and edit settings interactively
    Shell,

    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "liveini=debug" } else { "liveini=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => commands::default_config_path()?,
    };

    if let Commands::Config { init } = &cli.command {
        return commands::config::run(&config_path, *init);
    }

    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(exe_name) = cli.target {
        config.target.exe_name = exe_name;
    }
    let target = Target {
        pid: cli.pid,
        config,
    };

    match cli.command {
        Commands::Scan => commands::scan::run(&target),
        Commands::Settings {
            query,
            include,
            exclude,
            limit,
        } => commands::settings::run(&target, query.as_deref(), &include, &exclude, limit),
        Commands::Set { name, value } => commands::set::run(&target, &name, &value),
        Commands::Revert { name, default } => commands::set::revert(&target, &name, default),
        Commands::Dump {
            query,
            output,
            include,
            exclude,
        } => commands::dump::run(&target, query.as_deref(), output, &include, &exclude),
        Commands::Rtti { query, json, limit } => {
            commands::rtti::run(&target, query.as_deref(), json.as_deref(), limit)
        }
        Commands::Aob { pattern } => commands::aob::run(&target, &pattern),
        Commands::Method { address } => commands::method::run(&target, &address),
        Commands::Heap { address } => commands::heap::run(&target, &address),
        Commands::Shell => commands::shell::run(&target),
        Commands::Config { .. } => Ok(()),
    }
}
