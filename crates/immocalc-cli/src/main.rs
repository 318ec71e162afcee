mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::projection::{ProjectionArgs, ProjectionTable};
use commands::time_value::IrrArgs;

/// Financed rental-property projections
#[derive(Parser)]
#[command(
    name = "immocalc",
    version,
    about = "Financed rental-property projections",
    long_about = "Simulates the purchase of a rental property under construction month by month: \
                  equity and two-loan drawdown, construction-phase interest and commitment fees, \
                  annuity repayment, Sonder/degressive/linear AfA, marginal-rate tax effects, and \
                  the ROI, CAGR and IRR of a sale at the end of each year."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full projection and print every table
    Project(ProjectionArgs),
    /// Monthly financing ledger (draws, interest, tilgung, balances)
    Ledger(ProjectionArgs),
    /// Monthly rent, depreciation, taxable income and cashflow
    Cashflow(ProjectionArgs),
    /// Yearly roll-up of the monthly cashflow
    Yearly(ProjectionArgs),
    /// Profit, ROI, CAGR and IRR for a sale at the end of each year
    Returns(ProjectionArgs),
    /// Derived purchase, cost and loan figures
    Summary(ProjectionArgs),
    /// Internal rate of return of a raw cash flow series
    Irr(IrrArgs),
    /// Print the default configuration
    Defaults,
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
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_level) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::projection::run_projection(args, ProjectionTable::All),
        Commands::Ledger(args) => commands::projection::run_projection(args, ProjectionTable::Ledger),
        Commands::Cashflow(args) => {
            commands::projection::run_projection(args, ProjectionTable::Cashflow)
        }
        Commands::Yearly(args) => commands::projection::run_projection(args, ProjectionTable::Yearly),
        Commands::Returns(args) => {
            commands::projection::run_projection(args, ProjectionTable::Returns)
        }
        Commands::Summary(args) => {
            commands::projection::run_projection(args, ProjectionTable::Summary)
        }
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::Defaults => commands::projection::run_defaults(),
        Commands::Version => {
            println!("immocalc {}", env!("CARGO_PKG_VERSION"));
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
