use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dealcalc_core::income::{analyze_commercial_property, CommercialPropertyInput, PropertyType};

use super::insufficient;
use crate::input;

/// Arguments for a commercial property analysis
#[derive(Args)]
pub struct CommercialArgs {
    /// Path to a commercial property file; absent fields take market defaults
    #[arg(long)]
    pub input: Option<String>,

    /// Property type, e.g. office, retail, industrial, "mixed use", nnn
    #[arg(long)]
    pub property_type: Option<String>,

    #[arg(long)]
    pub price: Option<Decimal>,

    #[arg(long)]
    pub square_feet: Option<Decimal>,

    /// Annual base rent per square foot
    #[arg(long)]
    pub rent_per_sqft: Option<Decimal>,

    /// Loan rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,
}

pub fn run_commercial(args: CommercialArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut property: CommercialPropertyInput =
        input::load(args.input.as_deref())?.unwrap_or_default();

    if let Some(ref label) = args.property_type {
        property.property_type = label.parse::<PropertyType>()?;
    }
    if let Some(price) = args.price {
        property.purchase_price = price;
    }
    if let Some(sqft) = args.square_feet {
        property.square_footage = sqft;
    }
    if let Some(rent) = args.rent_per_sqft {
        property.base_rent_per_sqft = rent;
    }
    if let Some(rate) = args.rate {
        property.rate_pct = rate;
    }

    let result = analyze_commercial_property(&property)
        .ok_or_else(|| insufficient("purchase_price", "price and square footage are required"))?;
    Ok(serde_json::to_value(result)?)
}
