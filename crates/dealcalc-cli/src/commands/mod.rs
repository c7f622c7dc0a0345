pub mod acquisition;
pub mod commercial;
pub mod deal;
pub mod financing;
pub mod valuation;

use dealcalc_core::DealCalcError;

/// The error reported when an engine declines to compute.
pub(crate) fn insufficient(field: &str, reason: &str) -> Box<dyn std::error::Error> {
    Box::new(DealCalcError::insufficient(field, reason))
}
