mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::acquisition::AcquisitionArgs;
use commands::commercial::CommercialArgs;
use commands::deal::{DealArgs, DealFormArgs};
use commands::financing::{AmortizeArgs, IrrArgs, LoanSizeArgs};
use commands::valuation::ValuationArgs;

/// Deterministic real-estate and business-acquisition deal analysis
#[derive(Parser)]
#[command(
    name = "dealcalc",
    version,
    about = "Deterministic real-estate and business-acquisition deal analysis",
    long_about = "Analyse Buy & Hold, Fix & Flip and BRRRR rental deals, commercial \
                  buildings and small-business acquisitions with decimal precision. \
                  Inputs are JSON or YAML files (or stdin); every result carries its \
                  methodology, assumptions and warnings."
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
    /// Analyse a typed residential deal under its strategy
    Deal(DealArgs),
    /// Analyse a free-text deal sheet as a browser form posts it
    DealForm(DealFormArgs),
    /// Build a monthly amortisation schedule
    Amortize(AmortizeArgs),
    /// Solve the internal rate of return of a cash flow series
    Irr(IrrArgs),
    /// Size the largest loan a property supports under DSCR and LTV tests
    LoanSize(LoanSizeArgs),
    /// Value a small business from market multiples, DCF and assets
    Valuation(ValuationArgs),
    /// Analyse a commercial property against market benchmarks
    Commercial(CommercialArgs),
    /// Analyse a business acquisition with projections and scenarios
    Acquisition(AcquisitionArgs),
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
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Deal(args) => commands::deal::run_deal(args),
        Commands::DealForm(args) => commands::deal::run_deal_form(args),
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::Irr(args) => commands::financing::run_irr(args),
        Commands::LoanSize(args) => commands::financing::run_loan_size(args),
        Commands::Valuation(args) => commands::valuation::run_valuation(args),
        Commands::Commercial(args) => commands::commercial::run_commercial(args),
        Commands::Acquisition(args) => commands::acquisition::run_acquisition(args),
        Commands::Version => {
            println!("dealcalc {}", env!("CARGO_PKG_VERSION"));
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
