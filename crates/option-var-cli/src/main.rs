mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::pricing::PriceArgs;
use commands::var::VarArgs;

/// Historical-simulation VaR for European call option positions
#[derive(Parser)]
#[command(
    name = "ovar",
    version,
    about = "Historical-simulation VaR for European call option positions",
    long_about = "Reprices a European call along a simulated or observed spot path with \
                  Black-Scholes, builds the day-over-day portfolio P&L and reports the \
                  empirical (1 - alpha) VaR together with the change series."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate historical-simulation VaR of a call position
    Var(VarArgs),
    /// Price European calls with Black-Scholes over a set of spots
    Price(PriceArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the result, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Var(args) => commands::var::run_var(args),
        Commands::Price(args) => commands::pricing::run_price(args),
        Commands::Version => {
            println!("ovar {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
