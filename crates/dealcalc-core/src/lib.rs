pub mod error;
pub mod financing;
pub mod income;
pub mod parsing;
pub mod projection;
pub mod time_value;
pub mod types;

#[cfg(feature = "strategies")]
pub mod strategy;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "acquisition")]
pub mod acquisition;

pub use error::DealCalcError;
pub use types::*;

/// Standard result type for the edges of the engine (parsing keys, JSON I/O)
pub type DealCalcResult<T> = Result<T, DealCalcError>;
