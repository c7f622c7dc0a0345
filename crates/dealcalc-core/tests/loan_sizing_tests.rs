#![cfg(feature = "loan_sizing")]

use dealcalc_core::financing::{monthly_payment, size_loan, LoanSizingInput, SizingConstraint};
use proptest::prelude::{prop_assert, proptest};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn from_json(json: &str) -> LoanSizingInput {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_lender_defaults_apply() {
    let input = from_json(
        r#"{
            "property_value": "1000000",
            "gross_potential_rent": "110000",
            "operating_expenses": "40000",
            "rate_pct": "7"
        }"#,
    );
    assert_eq!(input.amortization_years, 25);
    assert_eq!(input.loan_term_years, 10);
    assert_eq!(input.target_dscr, dec!(1.25));
    assert_eq!(input.max_ltv_pct, dec!(75));

    let r = size_loan(&input).unwrap().result;
    // NOI 70,000 / 1.25
    assert_eq!(r.max_annual_debt_service, dec!(56000));
    assert_eq!(r.max_loan_by_ltv, dec!(750000));
    assert_eq!(r.constraint, SizingConstraint::Dscr);
}

#[test]
fn test_sized_loan_pays_exactly_the_dscr_budget() {
    let input = from_json(
        r#"{
            "property_value": "1000000",
            "gross_potential_rent": "110000",
            "operating_expenses": "40000",
            "rate_pct": "7"
        }"#,
    );
    let r = size_loan(&input).unwrap().result;
    let payment = monthly_payment(r.max_loan_amount, dec!(7), 25);
    assert!(
        (payment * dec!(12) - dec!(56000)).abs() < dec!(0.000001),
        "Expected 56,000 of debt service, got {}",
        payment * dec!(12)
    );
    assert_eq!(r.monthly_payment, payment);
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(48))]

    #[test]
    fn prop_loan_respects_both_tests(
        rent in 50_000u32..1_000_000,
        expense_share in 10u32..60,
        value in 500_000u32..10_000_000,
        rate_bp in 300u32..1_200,
    ) {
        let rent = Decimal::from(rent);
        let input = LoanSizingInput {
            property_value: Decimal::from(value),
            purchase_price: Decimal::from(value),
            gross_potential_rent: rent,
            other_income: Decimal::ZERO,
            vacancy_rate_pct: dec!(5),
            operating_expenses: rent * Decimal::from(expense_share) / dec!(100),
            property_taxes: Decimal::ZERO,
            insurance: Decimal::ZERO,
            management_pct: Decimal::ZERO,
            reserves_pct: Decimal::ZERO,
            rate_pct: Decimal::new(i64::from(rate_bp), 2),
            amortization_years: 25,
            loan_term_years: 10,
            target_dscr: dec!(1.25),
            max_ltv_pct: dec!(75),
        };
        let r = size_loan(&input).unwrap().result;

        prop_assert!(r.max_loan_amount <= r.max_loan_by_ltv);
        prop_assert!(r.max_loan_amount <= r.max_loan_by_dscr);
        prop_assert!(r.actual_dscr >= dec!(1.25) - dec!(0.000001));
        prop_assert!(r.actual_ltv <= dec!(75) + dec!(0.000001));
    }
}
