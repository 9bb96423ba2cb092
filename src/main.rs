//! Binary entry point for the apidoc-md CLI.
//!
//! ## Usage
//!
//! ```bash
//! # One aggregated README.md under docs/
//! apidoc-md generate metadata.json
//!
//! # One document per class, custom names
//! apidoc-md generate metadata.json --multi-file --link-template 'api/%c.md'
//!
//! # Dump the resolved model of one class
//! apidoc-md inspect metadata.json --class 'Acme\Http\Client'
//! ```
//!
//! Responses are JSON on stdout. Logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use apidoc_core::loader::{JsonMetadataLoader, MetadataLoader};
use apidoc_core::resolve::resolve;
use apidoc_core::symbols::SymbolTable;

use apidoc_md::config::{CliOverrides, FileConfig, ResolvedConfig};
use apidoc_md::error::{ApidocError, ApidocResult, OutputErrorCode};
use apidoc_md::generator::{Generator, GeneratorOptions};
use apidoc_md::output::{emit_response, ErrorResponse, GenerateResponse, InspectResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Cross-linked markdown API documentation from class metadata.
#[derive(Parser, Debug)]
#[command(name = "apidoc-md", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Project config file (default: apidoc.toml in the current directory, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate markdown documentation.
    Generate {
        /// Normalized metadata (JSON).
        input: PathBuf,

        /// Destination directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory holding class.md and index.md templates.
        #[arg(long)]
        template_dir: Option<PathBuf>,

        /// Document name pattern; %c is replaced by the dash-joined class name.
        #[arg(long)]
        link_template: Option<String>,

        /// Index heading.
        #[arg(long)]
        title: Option<String>,

        /// Write one aggregated document.
        #[arg(long, conflicts_with = "multi_file")]
        single_file: bool,

        /// Write one document per class plus an index.
        #[arg(long)]
        multi_file: bool,

        /// Index document name.
        #[arg(long)]
        index_file: Option<String>,
    },

    /// Print the resolved model as JSON.
    Inspect {
        /// Normalized metadata (JSON).
        input: PathBuf,

        /// Only this class (fully-qualified name).
        #[arg(long)]
        class: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON too
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn execute(cli: Cli) -> ApidocResult<()> {
    match cli.command {
        Command::Generate {
            input,
            output_dir,
            template_dir,
            link_template,
            title,
            single_file,
            multi_file,
            index_file,
        } => {
            let single_file = match (single_file, multi_file) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let overrides = CliOverrides {
                output_dir,
                template_dir,
                link_template,
                title,
                single_file,
                index_file,
            };
            execute_generate(&cli.global, input, &overrides)
        }
        Command::Inspect { input, class } => execute_inspect(input, class.as_deref()),
    }
}

// ============================================================================
// Command Executors
// ============================================================================

fn execute_generate(global: &GlobalArgs, input: PathBuf, overrides: &CliOverrides) -> ApidocResult<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| ApidocError::internal(format!("failed to get current directory: {}", e)))?;
    let (file_config, _) = FileConfig::discover(global.config.as_deref(), &cwd)?;
    let config = ResolvedConfig::resolve(&file_config, overrides)?;

    let generator = Generator::new(GeneratorOptions::from_config(&config))?;
    let summary = generator.run(&JsonMetadataLoader::new(input))?;

    let response = GenerateResponse::new(summary, config);
    emit_response(&response, &mut io::stdout()).map_err(|e| ApidocError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

fn execute_inspect(input: PathBuf, class: Option<&str>) -> ApidocResult<()> {
    let records = JsonMetadataLoader::new(input).load()?;
    let resolved = resolve(&SymbolTable::build(records)?);

    let definitions = match class {
        Some(name) => vec![resolved
            .get(name)
            .ok_or_else(|| ApidocError::ClassNotFound {
                name: name.to_string(),
            })?],
        None => resolved.iter().collect(),
    };

    let response = InspectResponse::new(resolved.len(), definitions);
    emit_response(&response, &mut io::stdout()).map_err(|e| ApidocError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}
