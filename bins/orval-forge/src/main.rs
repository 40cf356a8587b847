//! orval-forge - Orval with a configurable HTTP client
//!
//! Drives the Orval code generator so that every generated API call routes
//! through the HTTP client variant named in `orval-forge.config.json`.

use clap::{Parser, Subcommand, ValueEnum};
use forge_cli::print_error;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod watch;

use commands::{config, generate, info, init};

/// Orval wrapper with custom HTTP client integration
#[derive(Parser)]
#[command(name = "orval-forge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate API code from an OpenAPI/Swagger specification
    #[command(visible_alias = "g")]
    Generate {
        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Watch the config and input files and regenerate on change
        #[arg(short, long)]
        watch: bool,

        /// Show what would be generated without running the generator
        #[arg(long)]
        dry_run: bool,

        /// Directory holding the client adapter files
        #[arg(long, env = "ORVAL_FORGE_ADAPTER_DIR")]
        adapter_dir: Option<PathBuf>,
    },

    /// Initialize a configuration file and write the client adapters
    Init {
        /// HTTP client type
        #[arg(long, default_value = "Rich")]
        client: String,

        /// Output directory for generated code
        #[arg(long, default_value = "./generated")]
        output: String,

        /// OpenAPI specification path or URL
        #[arg(long)]
        input: String,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show the current configuration
    Config {
        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version and available HTTP clients
    Info,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("orval_forge=debug,forge_generator=debug,forge_http=debug,forge_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            config,
            watch,
            dry_run,
            adapter_dir,
        } => generate::run(
            &generate::GenerateArgs {
                config,
                watch,
                dry_run,
                adapter_dir,
                verbose: cli.verbose,
            },
            cli.format,
        ),
        Commands::Init {
            client,
            output,
            input,
            force,
        } => init::run(&client, &output, &input, force),
        Commands::Config { config } => config::run(config.as_deref(), cli.format),
        Commands::Info => info::run(cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<forge_core::Error>() {
                Some(coded) => print_error(coded),
                None => eprintln!("{} {:#}", "Error:".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}
