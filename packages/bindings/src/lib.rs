use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use dealcalc_core::DealCalcError;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Engines return `None` when a required figure is missing; report it by field.
fn required<T>(output: Option<T>, field: &str, reason: &str) -> NapiResult<T> {
    output.ok_or_else(|| to_napi_error(DealCalcError::insufficient(field, reason)))
}

// ---------------------------------------------------------------------------
// Residential deals
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_deal(input_json: String) -> NapiResult<String> {
    let input: dealcalc_core::strategy::DealInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::strategy::analyze_deal(&input),
        "purchase_price",
        "a purchase price is required",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// The deal sheet as the browser posts it: camelCase keys, every value a string.
#[napi]
pub fn analyze_deal_form(form_json: String) -> NapiResult<String> {
    let form: dealcalc_core::strategy::DealForm =
        serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let input = form.to_input().map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::strategy::analyze_deal(&input),
        "purchasePrice",
        "a purchase price is required",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let input: dealcalc_core::financing::LoanTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::financing::amortize(&input),
        "principal",
        "a loan needs principal and a term",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn size_loan(input_json: String) -> NapiResult<String> {
    let input: dealcalc_core::financing::LoanSizingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::financing::size_loan(&input),
        "gross_potential_rent",
        "rent and property value are required",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize, Serialize)]
struct IrrRequest {
    cash_flows: Vec<Decimal>,
    #[serde(default)]
    guess: Option<Decimal>,
}

#[napi]
pub fn solve_irr(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let request: IrrRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let guess = request
        .guess
        .unwrap_or(dealcalc_core::time_value::DEFAULT_IRR_GUESS);
    let solution = dealcalc_core::time_value::solve_irr_detailed(&request.cash_flows, guess);

    let mut warnings = Vec::new();
    if !solution.converged {
        warnings.push(format!(
            "IRR did not converge; {}% is a best estimate",
            solution.rate_pct
        ));
    }
    let output = dealcalc_core::types::with_metadata(
        "Internal rate of return (Newton-Raphson with bisection fallback)",
        &request,
        warnings,
        start.elapsed().as_micros() as u64,
        solution,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Commercial property
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_commercial_property(input_json: String) -> NapiResult<String> {
    let input: dealcalc_core::income::CommercialPropertyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::income::analyze_commercial_property(&input),
        "purchase_price",
        "price and square footage are required",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Business valuation and acquisition
// ---------------------------------------------------------------------------

#[napi]
pub fn value_business(input_json: String) -> NapiResult<String> {
    let input: dealcalc_core::valuation::ValuationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::valuation::value_business(&input),
        "annual_sde",
        "earnings are needed to value a business",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_acquisition(input_json: String) -> NapiResult<String> {
    let input: dealcalc_core::acquisition::AcquisitionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = required(
        dealcalc_core::acquisition::analyze_acquisition(&input),
        "annual_sde",
        "asking price and SDE must both be positive",
    )?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Lenient parsing for form fields
// ---------------------------------------------------------------------------

/// Parse a typed currency amount ("$1,250.50"); unparseable text is "0".
#[napi]
pub fn parse_currency(text: String) -> String {
    dealcalc_core::parsing::parse_currency(&text).to_string()
}

/// Parse a typed percentage ("7.5%"); unparseable text is "0".
#[napi]
pub fn parse_percent(text: String) -> String {
    dealcalc_core::parsing::parse_percent(&text).to_string()
}
