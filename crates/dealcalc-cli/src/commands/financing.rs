use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use dealcalc_core::financing::{amortize, size_loan, LoanSizingInput, LoanTerms};
use dealcalc_core::time_value::{npv, solve_irr_detailed, IrrSolution, DEFAULT_IRR_GUESS};
use dealcalc_core::types::with_metadata;

use super::insufficient;
use crate::input;

/// Arguments for an amortisation schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to a loan terms file
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (7.5 = 7.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortisation period in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Only report the yearly roll-up, not every monthly payment
    #[arg(long)]
    pub yearly: bool,
}

/// Arguments for an internal rate of return
#[derive(Args)]
pub struct IrrArgs {
    /// Path to a cash flow file
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated cash flows, initial outlay first (e.g. -100000,12000,125000)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting guess as a decimal rate
    #[arg(long)]
    pub guess: Option<Decimal>,
}

/// Arguments for sizing a loan against DSCR and LTV
#[derive(Args)]
pub struct LoanSizeArgs {
    /// Path to a loan sizing input file
    #[arg(long)]
    pub input: Option<String>,

    /// Appraised value
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Annual gross potential rent
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Annual operating expenses
    #[arg(long, default_value = "0")]
    pub expenses: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Minimum debt service coverage the lender accepts
    #[arg(long, default_value = "1.25")]
    pub target_dscr: Decimal,

    /// Maximum loan-to-value in percent
    #[arg(long, default_value = "75")]
    pub max_ltv: Decimal,
}

#[derive(Debug, Deserialize, Serialize)]
struct IrrRequest {
    cash_flows: Vec<Decimal>,
    #[serde(default = "default_guess")]
    guess: Decimal,
}

fn default_guess() -> Decimal {
    DEFAULT_IRR_GUESS
}

#[derive(Debug, Serialize)]
struct IrrReport {
    irr: Decimal,
    #[serde(flatten)]
    solution: IrrSolution,
    /// NPV of the flows at the solved rate; near zero when converged
    npv_at_irr: Option<Decimal>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::load(args.input.as_deref())? {
        Some(terms) => terms,
        None => LoanTerms::new(
            args.principal.ok_or("--principal is required (or provide --input)")?,
            args.rate.ok_or("--rate is required (or provide --input)")?,
            args.years.ok_or("--years is required (or provide --input)")?,
        ),
    };
    let mut result = amortize(&terms)
        .ok_or_else(|| insufficient("principal", "a loan needs principal and a term"))?;
    if args.yearly {
        result.result.rows.clear();
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let request: IrrRequest = match input::load(args.input.as_deref())? {
        Some(req) => req,
        None => IrrRequest {
            cash_flows: args
                .cash_flows
                .ok_or("--cash-flows is required (or provide --input)")?,
            guess: args.guess.unwrap_or(DEFAULT_IRR_GUESS),
        },
    };
    if request.cash_flows.len() < 2 {
        return Err(insufficient("cash_flows", "an outlay and at least one return are required"));
    }

    let solution = solve_irr_detailed(&request.cash_flows, request.guess);
    let mut warnings = Vec::new();
    if !solution.converged {
        warnings.push(format!(
            "IRR did not converge after {} iterations; {}% is a best estimate",
            solution.iterations, solution.rate_pct
        ));
    }
    let report = IrrReport {
        irr: solution.rate_pct,
        npv_at_irr: npv(solution.rate_pct / Decimal::ONE_HUNDRED, &request.cash_flows),
        solution,
    };
    let output = with_metadata(
        "Internal rate of return (Newton-Raphson with bisection fallback)",
        &request,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_loan_size(args: LoanSizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sizing: LoanSizingInput = match input::load(args.input.as_deref())? {
        Some(sizing) => sizing,
        None => {
            let value = args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?;
            LoanSizingInput {
                property_value: value,
                purchase_price: value,
                gross_potential_rent: args.rent.ok_or("--rent is required (or provide --input)")?,
                other_income: Decimal::ZERO,
                vacancy_rate_pct: Decimal::ZERO,
                operating_expenses: args.expenses,
                property_taxes: Decimal::ZERO,
                insurance: Decimal::ZERO,
                management_pct: Decimal::ZERO,
                reserves_pct: Decimal::ZERO,
                rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
                amortization_years: 25,
                loan_term_years: 10,
                target_dscr: args.target_dscr,
                max_ltv_pct: args.max_ltv,
            }
        }
    };
    let result = size_loan(&sizing)
        .ok_or_else(|| insufficient("gross_potential_rent", "rent and property value are required"))?;
    Ok(serde_json::to_value(result)?)
}
