use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dealcalc_core::acquisition::{analyze_acquisition, AcquisitionInput};
use dealcalc_core::valuation::{Industry, Sector};

use super::insufficient;
use crate::input;

/// Arguments for a business acquisition analysis
#[derive(Args)]
pub struct AcquisitionArgs {
    /// Path to an acquisition file; absent fields take the calculator defaults
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub industry: Option<String>,

    /// Sector for the asking-price checks (e.g. realestate); unknown names mean other
    #[arg(long)]
    pub sector: Option<String>,

    #[arg(long)]
    pub asking_price: Option<Decimal>,

    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Principal carried back by the seller
    #[arg(long)]
    pub seller_financing: Option<Decimal>,

    #[arg(long)]
    pub sde: Option<Decimal>,

    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Year the business is sold
    #[arg(long)]
    pub exit_year: Option<u32>,
}

pub fn run_acquisition(args: AcquisitionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut deal: AcquisitionInput = input::load(args.input.as_deref())?.unwrap_or_default();

    if let Some(ref label) = args.industry {
        deal.industry = label.parse::<Industry>()?;
    }
    if let Some(ref key) = args.sector {
        deal.sector = Some(Sector::from_key(key));
    }
    if let Some(v) = args.asking_price {
        deal.asking_price = v;
    }
    if let Some(v) = args.down_payment {
        deal.down_payment = v;
    }
    if let Some(v) = args.seller_financing {
        deal.seller_financing = v;
    }
    if let Some(v) = args.sde {
        deal.annual_sde = v;
    }
    if let Some(v) = args.revenue {
        deal.annual_revenue = v;
    }
    if let Some(v) = args.exit_year {
        deal.exit_timeline_years = v;
    }

    let result = analyze_acquisition(&deal)
        .ok_or_else(|| insufficient("annual_sde", "asking price and SDE must both be positive"))?;
    Ok(serde_json::to_value(result)?)
}
