mod logging;

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;
use tablegen::config::{Config, ConfigError, DEFAULT_CONFIG_FILE};
use tablegen::generate::{self, FsWriter, Passthrough};
use tablegen::ir::SchemaError;
use thiserror::Error;

#[derive(Parser)]
#[command(
    name = "tablegen",
    about = "Generate validator schemas and ER diagrams from annotated table definitions"
)]
struct Cli {
    /// Path to the config file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Override the config's input file
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{0} target(s) failed")]
    Targets(usize),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = Config::load(&cli.config).map_err(|source| CliError::Config {
        path: cli.config.clone(),
        source,
    })?;

    let config = match cli.input {
        Some(path) => config.with_input(path),
        None => config,
    };
    let input = config
        .input()
        .map_err(|source| CliError::Config {
            path: cli.config.clone(),
            source,
        })?
        .to_path_buf();

    let source = fs::read_to_string(&input).map_err(|source| CliError::Read {
        path: input.clone(),
        source,
    })?;

    let report = generate::run(&config, &source, &Passthrough, &FsWriter)?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("{:<8} {}", outcome.target, outcome.output.display()),
            Err(e) => eprintln!("{:<8} {}", outcome.target, e),
        }
    }

    match report.failures().count() {
        0 => Ok(()),
        n => Err(CliError::Targets(n)),
    }
}

fn main() {
    logging::init_logger();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
