use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{clamp_with_warning, with_metadata, ComputationOutput, Money, Percent, Rate};

/// Longest loan term or hold period the engine will model, in years.
pub const MAX_TERM_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A level-payment, fully amortising loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Annual interest rate as a percentage (7.5 = 7.5%)
    pub annual_rate_pct: Percent,
    /// Amortisation period in years
    pub term_years: u32,
}

/// One monthly payment of an amortisation schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based payment number
    pub period_index: u32,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
}

/// Twelve schedule rows rolled up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub total_payment: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    pub ending_balance: Money,
}

/// Full schedule with totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub total_payments: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub yearly: Vec<AmortizationYear>,
    pub rows: Vec<AmortizationRow>,
}

// ---------------------------------------------------------------------------
// LoanTerms
// ---------------------------------------------------------------------------

impl LoanTerms {
    pub fn new(principal: Money, annual_rate_pct: Percent, term_years: u32) -> Self {
        LoanTerms {
            principal,
            annual_rate_pct,
            term_years,
        }
    }

    /// Annual percentage rate / 100 / 12.
    pub fn monthly_rate(&self) -> Rate {
        monthly_rate(self.annual_rate_pct)
    }

    pub fn total_periods(&self) -> u32 {
        term_months(self.term_years)
    }

    pub fn monthly_payment(&self) -> Money {
        monthly_payment(self.principal, self.annual_rate_pct, self.term_years)
    }

    pub fn annual_debt_service(&self) -> Money {
        self.monthly_payment() * dec!(12)
    }

    pub fn schedule(&self) -> Vec<AmortizationRow> {
        build_schedule(self.principal, self.annual_rate_pct, self.term_years)
    }

    /// Outstanding balance after `months` scheduled payments.
    pub fn balance_after(&self, months: u32) -> Money {
        self.advance_balance(self.principal, months)
    }

    /// Apply `months` scheduled payments to `balance`. Stops once the loan is repaid.
    pub fn advance_balance(&self, balance: Money, months: u32) -> Money {
        let rate = self.monthly_rate();
        let payment = self.monthly_payment();
        let mut balance = balance;
        for _ in 0..months {
            if balance <= Decimal::ZERO {
                break;
            }
            balance = step_balance(balance, rate, payment).2;
        }
        balance
    }

    /// Copy with principal floored at 0, rate in [0, 100] and term capped at
    /// `MAX_TERM_YEARS`. `label` prefixes any warning.
    pub fn sanitized(&self, label: &str, warnings: &mut Vec<String>) -> LoanTerms {
        let principal = self.principal.max(Decimal::ZERO);
        let annual_rate_pct = clamp_with_warning(
            &format!("{label} rate"),
            self.annual_rate_pct,
            Decimal::ZERO,
            dec!(100),
            warnings,
        );
        let term_years = if self.term_years > MAX_TERM_YEARS {
            warnings.push(format!(
                "{label} term of {} years capped at {MAX_TERM_YEARS}",
                self.term_years
            ));
            MAX_TERM_YEARS
        } else {
            self.term_years
        };
        LoanTerms {
            principal,
            annual_rate_pct,
            term_years,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level monthly payment: `P * r(1+r)^n / ((1+r)^n - 1)`.
///
/// Returns 0 when there is nothing to amortise yet (no principal, no term,
/// or a negative rate). A zero rate repays the principal straight-line.
/// Terms longer than [`MAX_TERM_YEARS`] amortise over `MAX_TERM_YEARS`.
pub fn monthly_payment(principal: Money, annual_rate_pct: Percent, years: u32) -> Money {
    if principal <= Decimal::ZERO || years == 0 || annual_rate_pct < Decimal::ZERO {
        return Decimal::ZERO;
    }

    let months = term_months(years);
    let periods = Decimal::from(months);
    let rate = monthly_rate(annual_rate_pct);
    if rate.is_zero() {
        return principal / periods;
    }

    match (Decimal::ONE + rate).checked_powi(i64::from(months)) {
        Some(compound) => {
            let denominator = compound - Decimal::ONE;
            if denominator <= Decimal::ZERO {
                return principal / periods;
            }
            principal * rate * (compound / denominator)
        }
        // (1+r)^n beyond Decimal range: the annuity factor has converged to r.
        None => principal * rate,
    }
}

/// Number of monthly payments in a term, capped at [`MAX_TERM_YEARS`].
pub fn term_months(years: u32) -> u32 {
    years.min(MAX_TERM_YEARS) * 12
}

/// Interest-only monthly payment.
pub fn interest_only_payment(principal: Money, annual_rate_pct: Percent) -> Money {
    if principal <= Decimal::ZERO || annual_rate_pct <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    principal * monthly_rate(annual_rate_pct)
}

/// Month-by-month schedule over `years * 12` periods, `years` capped at
/// [`MAX_TERM_YEARS`].
///
/// The ending balance is floored at 0 so rounding on the last payment never
/// leaves a negative balance. Empty when `monthly_payment` is 0.
pub fn build_schedule(principal: Money, annual_rate_pct: Percent, years: u32) -> Vec<AmortizationRow> {
    let payment = monthly_payment(principal, annual_rate_pct, years);
    if payment.is_zero() {
        return Vec::new();
    }

    let rate = monthly_rate(annual_rate_pct);
    let periods = term_months(years);
    let mut rows = Vec::with_capacity(periods as usize);
    let mut balance = principal;

    for period_index in 1..=periods {
        let (interest, principal_portion, ending_balance) = step_balance(balance, rate, payment);
        rows.push(AmortizationRow {
            period_index,
            payment_amount: payment,
            principal_portion,
            interest_portion: interest,
            ending_balance,
        });
        balance = ending_balance;
    }

    rows
}

/// Schedule with yearly roll-ups and lifetime totals.
///
/// `None` when the loan has no principal or no term.
pub fn amortize(terms: &LoanTerms) -> Option<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = terms.sanitized("loan", &mut warnings);
    if terms.principal.is_zero() || terms.term_years == 0 {
        return None;
    }

    let rows = terms.schedule();
    let monthly_payment = terms.monthly_payment();

    let yearly: Vec<AmortizationYear> = rows
        .chunks(12)
        .enumerate()
        .map(|(i, chunk)| AmortizationYear {
            year: i as u32 + 1,
            total_payment: chunk.iter().map(|r| r.payment_amount).sum(),
            total_principal: chunk.iter().map(|r| r.principal_portion).sum(),
            total_interest: chunk.iter().map(|r| r.interest_portion).sum(),
            ending_balance: chunk.last().map(|r| r.ending_balance).unwrap_or_default(),
        })
        .collect();

    let total_payments: Money = rows.iter().map(|r| r.payment_amount).sum();
    let total_interest: Money = rows.iter().map(|r| r.interest_portion).sum();
    let total_principal: Money = rows.iter().map(|r| r.principal_portion).sum();

    if terms.annual_rate_pct.is_zero() {
        warnings.push("Zero interest rate: principal repaid straight-line".into());
    }

    let output = AmortizationSchedule {
        monthly_payment,
        annual_debt_service: monthly_payment * dec!(12),
        total_payments,
        total_interest,
        total_principal,
        yearly,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        "Level-payment amortisation (monthly compounding)",
        &terms,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monthly_rate(annual_rate_pct: Percent) -> Rate {
    annual_rate_pct / dec!(100) / dec!(12)
}

/// One payment: returns (interest, principal portion, ending balance).
fn step_balance(balance: Money, rate: Rate, payment: Money) -> (Money, Money, Money) {
    let interest = balance * rate;
    let principal_portion = payment - interest;
    let ending = (balance - principal_portion).max(Decimal::ZERO);
    (interest, principal_portion, ending)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_payment_reference() {
        // $200k, 6%, 30 years: 1,199.10 on any published mortgage table
        let pmt = monthly_payment(dec!(200000), dec!(6), 30);
        assert!(
            (pmt - dec!(1199.101050305504789)).abs() < dec!(0.000001),
            "Expected ~1199.10, got {pmt}"
        );
    }

    #[test]
    fn test_monthly_payment_sentinels() {
        assert_eq!(monthly_payment(Decimal::ZERO, dec!(6), 30), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(100000), dec!(6), 0), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(-5), dec!(6), 30), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(100000), dec!(-1), 30), Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        // 120,000 over 10 years = 1,000 per month
        assert_eq!(monthly_payment(dec!(120000), Decimal::ZERO, 10), dec!(1000));
    }

    #[test]
    fn test_first_year_of_schedule() {
        let rows = build_schedule(dec!(200000), dec!(6), 30);
        assert_eq!(rows.len(), 360);

        // First month interest = 200,000 * 0.005 = 1,000
        assert_eq!(rows[0].interest_portion, dec!(1000));
        assert_eq!(rows[0].period_index, 1);

        let first_year_interest: Decimal = rows[..12].iter().map(|r| r.interest_portion).sum();
        assert!(
            (first_year_interest - dec!(11933.19)).abs() < dec!(0.01),
            "Year 1 interest ~11,933.19, got {first_year_interest}"
        );
        assert!((rows[11].ending_balance - dec!(197543.98)).abs() < dec!(0.01));
    }

    #[test]
    fn test_schedule_pays_off() {
        let rows = build_schedule(dec!(350000), dec!(7.25), 25);
        let last = rows.last().unwrap();
        assert!(last.ending_balance < dec!(0.000001), "Residual {}", last.ending_balance);
        assert!(rows.iter().all(|r| r.ending_balance >= Decimal::ZERO));
    }

    #[test]
    fn test_empty_schedule_when_nothing_to_amortise() {
        assert!(build_schedule(Decimal::ZERO, dec!(5), 30).is_empty());
        assert!(build_schedule(dec!(1000), dec!(5), 0).is_empty());
    }

    #[test]
    fn test_balance_after_matches_schedule() {
        let terms = LoanTerms::new(dec!(200000), dec!(6), 30);
        let rows = terms.schedule();
        assert_eq!(terms.balance_after(0), dec!(200000));
        assert_eq!(terms.balance_after(60), rows[59].ending_balance);
        assert_eq!(terms.balance_after(400), Decimal::ZERO);
    }

    #[test]
    fn test_interest_only_payment() {
        // 225,000 at 12% = 2,250 / month
        assert_eq!(interest_only_payment(dec!(225000), dec!(12)), dec!(2250));
        assert_eq!(interest_only_payment(dec!(225000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_amortize_yearly_rollup() {
        let out = amortize(&LoanTerms::new(dec!(200000), dec!(6), 30)).unwrap();
        let schedule = &out.result;
        assert_eq!(schedule.yearly.len(), 30);
        assert_eq!(schedule.yearly[0].year, 1);
        assert_eq!(schedule.yearly[0].ending_balance, schedule.rows[11].ending_balance);
        assert!(
            (schedule.total_interest - (schedule.total_payments - dec!(200000))).abs() < dec!(0.0001)
        );
        assert_eq!(schedule.annual_debt_service, schedule.monthly_payment * dec!(12));
    }

    #[test]
    fn test_amortize_insufficient_input() {
        assert!(amortize(&LoanTerms::new(Decimal::ZERO, dec!(6), 30)).is_none());
        assert!(amortize(&LoanTerms::new(dec!(1000), dec!(6), 0)).is_none());
    }

    #[test]
    fn test_sanitized_clamps() {
        let mut warnings = Vec::new();
        let terms = LoanTerms::new(dec!(100000), dec!(150), 80).sanitized("loan", &mut warnings);
        assert_eq!(terms.annual_rate_pct, dec!(100));
        assert_eq!(terms.term_years, MAX_TERM_YEARS);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_huge_term_is_capped() {
        let capped = monthly_payment(dec!(100000), dec!(6), MAX_TERM_YEARS);
        assert_eq!(monthly_payment(dec!(100000), dec!(6), u32::MAX), capped);
        assert_eq!(build_schedule(dec!(100000), dec!(6), u32::MAX).len(), 600);
        assert_eq!(LoanTerms::new(dec!(100000), dec!(6), u32::MAX).total_periods(), 600);
        assert_eq!(term_months(u32::MAX), MAX_TERM_YEARS * 12);
    }
}
