use clap::{Parser as ClapParser, Subcommand};
use sieve::cli::{self, CheckOptions, CheckResult, CliError};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sieve")]
#[command(about = "Sieve - validate and normalize entity filter expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a filter and print its canonical form
    Check {
        /// The filter to check (reads from stdin if not provided)
        filter: Option<String>,

        /// Print the {"Filter": ...} wire object
        #[arg(short, long)]
        wire: bool,

        /// Pretty-print the wire object
        #[arg(short, long)]
        pretty: bool,
    },

    /// Read a {"Filter": ...} wire object and print the normalized filter
    Unwire {
        /// The JSON object (reads from stdin if not provided)
        json: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SIEVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            filter,
            wire,
            pretty,
        } => run_check(filter, wire, pretty),
        Commands::Unwire { json } => run_unwire(json),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn read_argument(arg: Option<String>) -> Result<String, CliError> {
    match arg {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

fn run_check(filter: Option<String>, wire: bool, pretty: bool) -> Result<(), CliError> {
    let options = CheckOptions {
        filter: read_argument(filter)?,
        wire,
        pretty,
    };

    match cli::execute_check(&options)? {
        CheckResult::Canonical(text) => println!("{}", text),
        CheckResult::Wire(json) => println!("{}", json),
    }
    Ok(())
}

fn run_unwire(json: Option<String>) -> Result<(), CliError> {
    let json = read_argument(json)?;
    println!("{}", cli::execute_unwire(&json)?);
    Ok(())
}
