use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financing::LoanTerms;
use crate::types::{clamp_with_warning, pct, safe_div, safe_pct, Money, Percent};

use super::deal::DealContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrrrrResult {
    /// Down payment + buy-side closing + rehab
    pub initial_cash_invested: Money,
    pub refinance_amount: Money,
    /// Refinance proceeds less the original loan payoff
    pub cash_out_from_refi: Money,
    /// Negative when the refinance returns more than was put in
    pub cash_left_in_deal: Money,
    pub new_monthly_payment: Money,
    pub new_annual_debt_service: Money,
    pub annual_cash_flow_after_refi: Money,
    pub monthly_cash_flow_after_refi: Money,
    /// Absent when all cash came back out (see `infinite_return`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_on_cash_after_refi: Option<Percent>,
    /// No cash left in the deal, so any cash flow is an unbounded return
    pub infinite_return: bool,
    pub dscr_after_refi: Decimal,
    /// ARV less the new loan
    pub equity_after_refi: Money,
}

pub(crate) fn evaluate(ctx: &DealContext, warnings: &mut Vec<String>) -> BrrrrResult {
    let initial_cash_invested = ctx.down_payment + ctx.closing_costs_buy + ctx.rehab_costs;

    let ltv = clamp_with_warning(
        "refinance ltv_pct",
        ctx.refinance.ltv_pct,
        Decimal::ZERO,
        dec!(100),
        warnings,
    );
    let refinance_amount = ctx.after_repair_value * pct(ltv);
    let cash_out_from_refi = refinance_amount - ctx.total_loan_amount();
    let cash_left_in_deal = initial_cash_invested - cash_out_from_refi;

    let new_loan = LoanTerms::new(refinance_amount, ctx.refinance.rate_pct, ctx.refinance.term_years)
        .sanitized("refinance", warnings);
    let new_monthly_payment = new_loan.monthly_payment();
    let new_annual_debt_service = new_monthly_payment * dec!(12);

    let noi = ctx.statement.net_operating_income;
    let annual_cash_flow_after_refi = noi - new_annual_debt_service;

    let infinite_return = cash_left_in_deal <= Decimal::ZERO;
    let cash_on_cash_after_refi =
        (!infinite_return).then(|| safe_pct(annual_cash_flow_after_refi, cash_left_in_deal));

    if ctx.after_repair_value.is_zero() {
        warnings.push("No after-repair value entered; the refinance raises nothing".into());
    }
    if cash_out_from_refi < Decimal::ZERO {
        warnings.push(format!(
            "Refinance of {refinance_amount} does not cover the existing loan; {:.2} short",
            -cash_out_from_refi
        ));
    }

    BrrrrResult {
        initial_cash_invested,
        refinance_amount,
        cash_out_from_refi,
        cash_left_in_deal,
        new_monthly_payment,
        new_annual_debt_service,
        annual_cash_flow_after_refi,
        monthly_cash_flow_after_refi: annual_cash_flow_after_refi / dec!(12),
        cash_on_cash_after_refi,
        infinite_return,
        dscr_after_refi: safe_div(noi, new_annual_debt_service),
        equity_after_refi: ctx.after_repair_value - refinance_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::deal::tests::sample_deal;
    use crate::strategy::{analyze_deal, DealInput, RefinanceTerms, Strategy, StrategyResult};

    fn brrrr(input: &DealInput) -> BrrrrResult {
        match analyze_deal(input).unwrap().result.strategy {
            StrategyResult::Brrrr(r) => r,
            other => panic!("expected brrrr, got {other:?}"),
        }
    }

    #[test]
    fn test_refinance_with_default_terms() {
        let r = brrrr(&sample_deal(Strategy::Brrrr));
        // 62,500 + 5,000 + 40,000
        assert_eq!(r.initial_cash_invested, dec!(107500));
        // 75% of 320,000
        assert_eq!(r.refinance_amount, dec!(240000));
        assert_eq!(r.cash_out_from_refi, dec!(52500));
        assert_eq!(r.cash_left_in_deal, dec!(55000));
        assert!(!r.infinite_return);

        // 240,000 at 7% over 30 years = 1,596.73 / month
        assert!((r.new_monthly_payment - dec!(1596.73)).abs() < dec!(0.01));
        let coc = r.cash_on_cash_after_refi.unwrap();
        assert_eq!(coc, r.annual_cash_flow_after_refi / dec!(55000) * dec!(100));
        assert_eq!(r.equity_after_refi, dec!(80000));
    }

    #[test]
    fn test_infinite_return_when_all_cash_recovered() {
        let mut input = sample_deal(Strategy::Brrrr);
        // Refinance 300,000 >= 107,500 invested + 187,500 original loan
        input.after_repair_value = dec!(400000);
        let r = brrrr(&input);
        assert_eq!(r.refinance_amount, dec!(300000));
        assert_eq!(r.cash_left_in_deal, dec!(-5000));
        assert!(r.infinite_return);
        assert!(r.cash_on_cash_after_refi.is_none());
    }

    #[test]
    fn test_exact_recovery_is_infinite() {
        let mut input = sample_deal(Strategy::Brrrr);
        // 100% of 295,000 pays off 187,500 and returns all 107,500
        input.financing.refinance = Some(RefinanceTerms {
            ltv_pct: dec!(100),
            ..RefinanceTerms::default()
        });
        input.after_repair_value = dec!(295000);
        let r = brrrr(&input);
        assert_eq!(r.cash_left_in_deal, Decimal::ZERO);
        assert!(r.infinite_return);
        assert!(r.cash_on_cash_after_refi.is_none());
    }

    #[test]
    fn test_short_refinance_warns() {
        let mut input = sample_deal(Strategy::Brrrr);
        input.after_repair_value = dec!(200000);
        let out = analyze_deal(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("does not cover")));
    }

    #[test]
    fn test_infinite_flag_serialises_without_coc() {
        let mut input = sample_deal(Strategy::Brrrr);
        input.after_repair_value = dec!(400000);
        let out = analyze_deal(&input).unwrap();
        let json = serde_json::to_value(&out.result.strategy).unwrap();
        assert_eq!(json["kind"], "brrrr");
        assert_eq!(json["infinite_return"], true);
        assert!(json.get("cash_on_cash_after_refi").is_none());
    }
}
