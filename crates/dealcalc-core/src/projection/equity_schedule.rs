use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::financing::amortization::MAX_TERM_YEARS;
use crate::financing::LoanTerms;
use crate::types::{pct, safe_pct, Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An asset bought with one or more amortising loans and held for a number of years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityScheduleInput {
    /// Value at acquisition (purchase price or business value)
    pub initial_value: Money,
    /// Annual appreciation (property) or revenue growth (business), percent
    pub growth_rate_pct: Percent,
    pub hold_period_years: u32,
    /// Primary loan first, then any seller note
    pub loans: Vec<LoanTerms>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityScheduleRow {
    /// 0 is the acquisition point
    pub year_index: u32,
    pub asset_value: Money,
    pub total_debt_balance: Money,
    /// Asset value less total debt; negative when the asset is under water
    pub equity: Money,
    pub equity_percent: Percent,
    /// Balance of each loan, in input order
    pub loan_balances: Vec<Money>,
    /// Principal repaid during this year across all loans
    pub principal_paid: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPosition {
    pub year_index: u32,
    pub exit_value: Money,
    pub exit_debt: Money,
    pub exit_equity: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquitySchedule {
    pub rows: Vec<EquityScheduleRow>,
    pub exit: ExitPosition,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Year-by-year value, debt and equity over `hold_period_years + 1` rows.
///
/// Row 0 is the acquisition point with no growth or amortisation applied.
/// Each later row compounds the value once and runs twelve monthly payments
/// on every loan.
pub fn build_equity_schedule(input: &EquityScheduleInput) -> EquitySchedule {
    let hold = input.hold_period_years.min(MAX_TERM_YEARS);
    let growth = Decimal::ONE + pct(input.growth_rate_pct);

    let mut value = input.initial_value;
    let mut balances: Vec<Money> = input.loans.iter().map(|l| l.principal).collect();
    let mut rows = Vec::with_capacity(hold as usize + 1);

    for year_index in 0..=hold {
        let mut principal_paid = Decimal::ZERO;
        if year_index > 0 {
            value *= growth;
            for (loan, balance) in input.loans.iter().zip(balances.iter_mut()) {
                let next = loan.advance_balance(*balance, 12);
                principal_paid += *balance - next;
                *balance = next;
            }
        }

        let total_debt_balance: Money = balances.iter().copied().sum();
        let equity = value - total_debt_balance;
        rows.push(EquityScheduleRow {
            year_index,
            asset_value: value,
            total_debt_balance,
            equity,
            equity_percent: safe_pct(equity, value),
            loan_balances: balances.clone(),
            principal_paid,
        });
    }

    let exit = ExitPosition {
        year_index: hold,
        exit_value: value,
        exit_debt: balances.iter().copied().sum(),
        exit_equity: value - balances.iter().copied().sum::<Money>(),
    };

    EquitySchedule { rows, exit }
}

/// Cash to the seller at exit: value less debt payoff less selling costs.
pub fn sale_proceeds(exit: &ExitPosition, selling_costs_pct: Percent) -> Money {
    exit.exit_value - exit.exit_debt - exit.exit_value * pct(selling_costs_pct)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
