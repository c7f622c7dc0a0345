pub mod statement;

#[cfg(feature = "commercial")]
pub mod commercial;

pub use statement::{
    build_income_statement, compute_ratios, DealExpenses, DealIncome, DealRatios, DscrBand,
    IncomeStatement, RatioBasis, TenantPassThroughs,
};

#[cfg(feature = "commercial")]
pub use commercial::{
    analyze_commercial_property, CommercialPropertyInput, CommercialPropertyOutput, PropertyType,
};
