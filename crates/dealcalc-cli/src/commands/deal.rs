use clap::Args;
use serde_json::Value;

use dealcalc_core::strategy::{analyze_deal, DealForm, DealInput, Strategy};

use super::insufficient;
use crate::input;

/// Arguments for a typed deal analysis
#[derive(Args)]
pub struct DealArgs {
    /// Path to a deal input file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Run under this strategy instead of the one in the file (buy-hold, fix-flip, brrrr)
    #[arg(long)]
    pub strategy: Option<String>,
}

/// Arguments for analysing a deal sheet posted as free text
#[derive(Args)]
pub struct DealFormArgs {
    /// Path to a deal sheet (camelCase fields, every value a string)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the sheet's strategy
    #[arg(long)]
    pub strategy: Option<String>,
}

pub fn run_deal(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut deal: DealInput = input::require(args.input.as_deref(), "deal analysis")?;
    if let Some(ref s) = args.strategy {
        deal.strategy = s.parse::<Strategy>()?;
    }
    analyze(&deal)
}

pub fn run_deal_form(args: DealFormArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let form: DealForm = input::require(args.input.as_deref(), "deal sheet analysis")?;
    let deal = match args.strategy {
        Some(ref s) => form.to_input_with(s.parse::<Strategy>()?),
        None => form.to_input()?,
    };
    analyze(&deal)
}

fn analyze(deal: &DealInput) -> Result<Value, Box<dyn std::error::Error>> {
    log::debug!("analysing {} deal at {}", deal.strategy, deal.purchase_price);
    let result = analyze_deal(deal)
        .ok_or_else(|| insufficient("purchase_price", "a purchase price is required"))?;
    Ok(serde_json::to_value(result)?)
}
