mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::lbo::{DefaultsArgs, EntryArgs, RunArgs, SensitivityArgs};

/// Leveraged buyout projections and return sensitivity
#[derive(Parser)]
#[command(
    name = "lbo",
    version,
    about = "Leveraged buyout projections and return sensitivity",
    long_about = "Sizes a leveraged acquisition from a company snapshot, rolls the \
                  debt and cash waterfall forward year by year, values the exit and \
                  sweeps entry/exit multiples into an IRR grid. All arithmetic uses \
                  decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full model: entry, projections, exit, cash flows, sensitivity
    Run(RunArgs),
    /// Entry valuation and sources & uses only
    Entry(EntryArgs),
    /// Entry/exit multiple IRR sensitivity grid
    Sensitivity(SensitivityArgs),
    /// Default assumptions seeded from a company snapshot
    Defaults(DefaultsArgs),
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

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Run(args) => commands::lbo::run_lbo(args),
        Commands::Entry(args) => commands::lbo::run_entry(args),
        Commands::Sensitivity(args) => commands::lbo::run_sensitivity(args),
        Commands::Defaults(args) => commands::lbo::run_defaults(args),
        Commands::Version => {
            println!("lbo {}", env!("CARGO_PKG_VERSION"));
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
