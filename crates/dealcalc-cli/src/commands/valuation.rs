use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dealcalc_core::valuation::{value_business, Industry, ValuationInput};

use super::insufficient;
use crate::input;

/// Arguments for a small-business valuation
#[derive(Args)]
pub struct ValuationArgs {
    /// Path to a valuation input file
    #[arg(long)]
    pub input: Option<String>,

    /// Industry for the market multiples (e.g. restaurant, "home services")
    #[arg(long)]
    pub industry: Option<String>,

    /// Seller's discretionary earnings
    #[arg(long)]
    pub sde: Option<Decimal>,

    /// EBITDA
    #[arg(long)]
    pub ebitda: Option<Decimal>,

    /// Annual revenue
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Annual SDE growth over the forecast, in percent
    #[arg(long)]
    pub growth: Option<Decimal>,
}

pub fn run_valuation(args: ValuationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let valuation: ValuationInput = match input::load(args.input.as_deref())? {
        Some(v) => v,
        None => {
            let industry = match args.industry {
                Some(ref label) => label.parse::<Industry>()?,
                None => Industry::default(),
            };
            ValuationInput {
                industry,
                annual_sde: args.sde.ok_or("--sde is required (or provide --input)")?,
                annual_ebitda: args.ebitda.unwrap_or(Decimal::ZERO),
                annual_revenue: args.revenue.unwrap_or(Decimal::ZERO),
                growth_rate_pct: args.growth.unwrap_or(Decimal::ZERO),
                ..ValuationInput::default()
            }
        }
    };
    let result = value_business(&valuation)
        .ok_or_else(|| insufficient("annual_sde", "earnings are needed to value a business"))?;
    Ok(serde_json::to_value(result)?)
}
