use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages as entered on a deal sheet (7.5 = 7.5%). Divide by 100 at point of use.
pub type Percent = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Used inside solvers.
pub type Rate = Decimal;

/// Multiples (e.g., 3.0x SDE)
pub type Multiple = Decimal;

/// A low / mid / high triple, used for multiple bands and the values they imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: Decimal,
    pub mid: Decimal,
    pub high: Decimal,
}

impl ValueRange {
    pub const fn new(low: Decimal, mid: Decimal, high: Decimal) -> Self {
        ValueRange { low, mid, high }
    }

    pub fn scale(&self, factor: Decimal) -> ValueRange {
        ValueRange {
            low: self.low * factor,
            mid: self.mid * factor,
            high: self.high * factor,
        }
    }
}

/// Convert a whole-number percentage into a rate.
pub fn pct(value: Percent) -> Rate {
    value / dec!(100)
}

/// Ratio with a guarded denominator: zero or negative denominators yield 0.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// `safe_div` expressed as a percentage.
pub fn safe_pct(numerator: Decimal, denominator: Decimal) -> Percent {
    safe_div(numerator, denominator) * dec!(100)
}

/// Clamp `value` into `[min, max]`, recording a warning when it moved.
pub fn clamp_with_warning(
    field: &str,
    value: Decimal,
    min: Decimal,
    max: Decimal,
    warnings: &mut Vec<String>,
) -> Decimal {
    let clamped = value.max(min).min(max);
    if clamped != value {
        log::warn!("{field} of {value} clamped to {clamped}");
        warnings.push(format!("{field} of {value} is outside [{min}, {max}]; using {clamped}"));
    }
    clamped
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
