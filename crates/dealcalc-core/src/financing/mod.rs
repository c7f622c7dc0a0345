pub mod amortization;

#[cfg(feature = "loan_sizing")]
pub mod loan_sizing;

pub use amortization::{
    amortize, build_schedule, interest_only_payment, monthly_payment, term_months, AmortizationRow,
    AmortizationSchedule, AmortizationYear, LoanTerms,
};

#[cfg(feature = "loan_sizing")]
pub use loan_sizing::{loan_for_payment, size_loan, LoanSizingInput, LoanSizingOutput, SizingConstraint};
