use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::financing::amortization::{term_months, MAX_TERM_YEARS};
use crate::financing::LoanTerms;
use crate::income::{build_income_statement, DealExpenses, DealIncome, DscrBand, IncomeStatement};
use crate::types::{
    clamp_with_warning, pct, safe_div, safe_pct, with_metadata, ComputationOutput, Money, Percent,
};

/// Smallest coverage target accepted; lower targets would size an unbounded loan.
pub const MIN_TARGET_DSCR: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A stabilised commercial property being sized for a new loan. All income
/// and expense figures are annual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSizingInput {
    /// Appraised value, the LTV basis
    pub property_value: Money,
    /// Price paid; the equity requirement is measured against this
    #[serde(default)]
    pub purchase_price: Money,
    pub gross_potential_rent: Money,
    #[serde(default)]
    pub other_income: Money,
    #[serde(default)]
    pub vacancy_rate_pct: Percent,
    /// Repairs, utilities, payroll and other operating costs
    #[serde(default)]
    pub operating_expenses: Money,
    #[serde(default)]
    pub property_taxes: Money,
    #[serde(default)]
    pub insurance: Money,
    #[serde(default)]
    pub management_pct: Percent,
    #[serde(default)]
    pub reserves_pct: Percent,
    pub rate_pct: Percent,
    #[serde(default = "default_amortization_years")]
    pub amortization_years: u32,
    /// Maturity; the balance outstanding then is the balloon
    #[serde(default = "default_loan_term_years")]
    pub loan_term_years: u32,
    #[serde(default = "default_target_dscr")]
    pub target_dscr: Decimal,
    #[serde(default = "default_max_ltv_pct")]
    pub max_ltv_pct: Percent,
}

/// Which lender test caps the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingConstraint {
    Dscr,
    Ltv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSizingOutput {
    pub income_statement: IncomeStatement,
    pub cap_rate: Percent,
    pub expense_ratio: Percent,
    /// NOI / target DSCR
    pub max_annual_debt_service: Money,
    pub max_loan_by_dscr: Money,
    pub max_loan_by_ltv: Money,
    /// Lower of the two tests
    pub max_loan_amount: Money,
    pub constraint: SizingConstraint,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub actual_dscr: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr_band: Option<DscrBand>,
    pub actual_ltv: Percent,
    pub debt_yield: Percent,
    /// Balance due at maturity when the term is shorter than the amortisation
    pub balloon_balance: Money,
    /// Purchase price less the loan; negative when the loan exceeds the price
    pub down_payment_required: Money,
    pub cash_flow_after_debt_service: Money,
    pub cash_on_cash: Percent,
}

fn default_amortization_years() -> u32 {
    25
}

fn default_loan_term_years() -> u32 {
    10
}

fn default_target_dscr() -> Decimal {
    dec!(1.25)
}

fn default_max_ltv_pct() -> Percent {
    dec!(75)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Principal a level `monthly_payment` supports over `years` at `annual_rate_pct`:
/// `M * ((1+r)^n - 1) / (r(1+r)^n)`. The inverse of [`super::monthly_payment`],
/// with the same term cap.
pub fn loan_for_payment(monthly_payment: Money, annual_rate_pct: Percent, years: u32) -> Money {
    if monthly_payment <= Decimal::ZERO || years == 0 || annual_rate_pct < Decimal::ZERO {
        return Decimal::ZERO;
    }

    let periods = term_months(years);
    let rate = pct(annual_rate_pct) / dec!(12);
    if rate.is_zero() {
        return monthly_payment * Decimal::from(periods);
    }

    match (Decimal::ONE + rate).checked_powi(i64::from(periods)) {
        Some(compound) => monthly_payment * (compound - Decimal::ONE) / (rate * compound),
        // Perpetuity limit
        None => monthly_payment / rate,
    }
}

/// Largest loan that passes both the DSCR and the LTV test.
///
/// Returns `None` until gross potential rent and property value are entered.
pub fn size_loan(input: &LoanSizingInput) -> Option<ComputationOutput<LoanSizingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.gross_potential_rent <= Decimal::ZERO || input.property_value <= Decimal::ZERO {
        return None;
    }

    let income = DealIncome {
        gross_scheduled_income: input.gross_potential_rent,
        other_income: input.other_income,
        vacancy_rate_pct: input.vacancy_rate_pct,
    }
    .sanitized(&mut warnings);
    let expenses = DealExpenses {
        property_taxes: input.property_taxes,
        insurance: input.insurance,
        management_pct: input.management_pct,
        reserves_pct: input.reserves_pct,
        other: input.operating_expenses,
        ..DealExpenses::default()
    }
    .sanitized(&mut warnings);
    let statement = build_income_statement(&income, &expenses);
    let noi = statement.net_operating_income;

    let target_dscr = if input.target_dscr <= Decimal::ZERO {
        warnings.push(format!(
            "Target DSCR of {} is not positive; using {}",
            input.target_dscr,
            default_target_dscr()
        ));
        default_target_dscr()
    } else {
        clamp_with_warning("target_dscr", input.target_dscr, MIN_TARGET_DSCR, dec!(100), &mut warnings)
    };
    let max_ltv = clamp_with_warning("max_ltv_pct", input.max_ltv_pct, Decimal::ZERO, dec!(100), &mut warnings);
    let rate_pct = clamp_with_warning("rate_pct", input.rate_pct, Decimal::ZERO, dec!(100), &mut warnings);
    let amortization_years = match input.amortization_years {
        0 => default_amortization_years(),
        y => y.min(MAX_TERM_YEARS),
    };

    if noi <= Decimal::ZERO {
        warnings.push(format!("NOI of {noi:.2} supports no debt"));
    }

    let max_annual_debt_service = (noi / target_dscr).max(Decimal::ZERO);
    let max_loan_by_dscr = loan_for_payment(max_annual_debt_service / dec!(12), rate_pct, amortization_years);
    let max_loan_by_ltv = input.property_value * pct(max_ltv);

    let (max_loan_amount, constraint) = if max_loan_by_dscr < max_loan_by_ltv {
        (max_loan_by_dscr, SizingConstraint::Dscr)
    } else {
        (max_loan_by_ltv, SizingConstraint::Ltv)
    };

    let loan = LoanTerms::new(max_loan_amount, rate_pct, amortization_years);
    let monthly_payment = loan.monthly_payment();
    let annual_debt_service = monthly_payment * dec!(12);
    let actual_dscr = safe_div(noi, annual_debt_service);

    let term_months = input.loan_term_years.min(amortization_years) * 12;
    let balloon_balance = if input.loan_term_years == 0 {
        Decimal::ZERO
    } else {
        loan.balance_after(term_months)
    };

    let down_payment_required = input.purchase_price - max_loan_amount;
    let cash_flow_after_debt_service = noi - annual_debt_service;

    if input.purchase_price > Decimal::ZERO && down_payment_required < Decimal::ZERO {
        warnings.push(format!(
            "Maximum loan exceeds the purchase price by {:.2}",
            -down_payment_required
        ));
    }

    let output = LoanSizingOutput {
        cap_rate: safe_pct(noi, input.property_value),
        expense_ratio: safe_pct(statement.total_operating_expenses, statement.effective_gross_income),
        max_annual_debt_service,
        max_loan_by_dscr,
        max_loan_by_ltv,
        max_loan_amount,
        constraint,
        monthly_payment,
        annual_debt_service,
        actual_dscr,
        dscr_band: (annual_debt_service > Decimal::ZERO).then(|| DscrBand::classify(actual_dscr)),
        actual_ltv: safe_pct(max_loan_amount, input.property_value),
        debt_yield: safe_pct(noi, max_loan_amount),
        balloon_balance,
        down_payment_required,
        cash_flow_after_debt_service,
        cash_on_cash: safe_pct(cash_flow_after_debt_service, down_payment_required),
        income_statement: statement,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        "CRE loan sizing (lesser of DSCR and LTV constraints)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// $2M stabilised property with $240k of rent
    fn sample_input() -> LoanSizingInput {
        LoanSizingInput {
            property_value: dec!(2000000),
            purchase_price: dec!(1900000),
            gross_potential_rent: dec!(240000),
            other_income: dec!(12000),
            vacancy_rate_pct: dec!(5),
            operating_expenses: dec!(48000),
            property_taxes: dec!(24000),
            insurance: dec!(8000),
            management_pct: dec!(5),
            reserves_pct: dec!(3),
            rate_pct: dec!(7.5),
            amortization_years: 25,
            loan_term_years: 10,
            target_dscr: dec!(1.25),
            max_ltv_pct: dec!(75),
        }
    }

    #[test]
    fn test_noi() {
        let out = size_loan(&sample_input()).unwrap();
        let s = &out.result.income_statement;
        // 252,000 less 5% vacancy
        assert_eq!(s.effective_gross_income, dec!(239400));
        // 48,000 + 24,000 + 8,000 + 11,970 mgmt + 7,182 reserves
        assert_eq!(s.total_operating_expenses, dec!(99152));
        assert_eq!(s.net_operating_income, dec!(140248));
    }

    #[test]
    fn test_dscr_constrains() {
        let out = size_loan(&sample_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.max_annual_debt_service, dec!(112198.4));
        assert_eq!(r.max_loan_by_ltv, dec!(1500000));
        assert!(
            (r.max_loan_by_dscr - dec!(1265220.34)).abs() < dec!(0.01),
            "Expected ~1,265,220.34, got {}",
            r.max_loan_by_dscr
        );
        assert_eq!(r.constraint, SizingConstraint::Dscr);
        assert_eq!(r.max_loan_amount, r.max_loan_by_dscr);
        // Sizing to the target lands back on it
        assert!((r.actual_dscr - dec!(1.25)).abs() < dec!(0.000001));
        assert_eq!(r.dscr_band, Some(DscrBand::Bankable));
        assert!((r.actual_ltv - dec!(63.26)).abs() < dec!(0.01));
    }

    #[test]
    fn test_ltv_constrains() {
        let mut input = sample_input();
        input.max_ltv_pct = dec!(50);
        let r = size_loan(&input).unwrap().result;
        assert_eq!(r.constraint, SizingConstraint::Ltv);
        assert_eq!(r.max_loan_amount, dec!(1000000));
        assert_eq!(r.actual_ltv, dec!(50));
        assert!(r.actual_dscr > dec!(1.25));
    }

    #[test]
    fn test_equity_and_balloon() {
        let r = size_loan(&sample_input()).unwrap().result;
        assert_eq!(r.down_payment_required, dec!(1900000) - r.max_loan_amount);
        // 25-year amortisation, 10-year term: most of the principal is still owed
        assert!(r.balloon_balance > r.max_loan_amount * dec!(0.7));
        assert!(r.balloon_balance < r.max_loan_amount);
        assert!((r.cash_on_cash - dec!(4.4188)).abs() < dec!(0.001));
    }

    #[test]
    fn test_loan_for_payment_inverts_payment() {
        let payment = crate::financing::monthly_payment(dec!(300000), dec!(6), 30);
        let principal = loan_for_payment(payment, dec!(6), 30);
        assert!((principal - dec!(300000)).abs() < dec!(0.000001));
        // Zero rate: payment times periods
        assert_eq!(loan_for_payment(dec!(1000), Decimal::ZERO, 10), dec!(120000));
    }

    #[test]
    fn test_negative_noi_supports_nothing() {
        let mut input = sample_input();
        input.operating_expenses = dec!(500000);
        let out = size_loan(&input).unwrap();
        assert_eq!(out.result.max_loan_by_dscr, Decimal::ZERO);
        assert_eq!(out.result.max_loan_amount, Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("supports no debt")));
    }

    #[test]
    fn test_requires_rent_and_value() {
        let mut input = sample_input();
        input.gross_potential_rent = Decimal::ZERO;
        assert!(size_loan(&input).is_none());
        let mut input = sample_input();
        input.property_value = Decimal::ZERO;
        assert!(size_loan(&input).is_none());
    }

    #[test]
    fn test_tiny_target_dscr_is_floored() {
        let mut input = sample_input();
        input.target_dscr = Decimal::new(1, 27);
        let out = size_loan(&input).unwrap();
        let r = &out.result;
        let noi = r.income_statement.net_operating_income;
        assert_eq!(r.max_annual_debt_service, noi / MIN_TARGET_DSCR);
        assert_eq!(r.constraint, SizingConstraint::Ltv);
        assert!(out.warnings.iter().any(|w| w.contains("target_dscr")));
    }

    #[test]
    fn test_loan_for_payment_caps_the_term() {
        assert_eq!(
            loan_for_payment(dec!(1000), dec!(6), u32::MAX),
            loan_for_payment(dec!(1000), dec!(6), MAX_TERM_YEARS)
        );
    }
}
