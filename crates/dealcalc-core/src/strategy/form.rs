use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DealCalcError;
use crate::income::{DealExpenses, DealIncome};
use crate::parsing::{parse_count_or, parse_currency, parse_percent, parse_percent_or};
use crate::DealCalcResult;

use super::deal::{
    DealInput, DownPayment, FinancingStructure, FlipAssumptions, HoldAssumptions, RefinanceTerms,
    Strategy,
};

/// The deal sheet exactly as typed: every field is free text.
///
/// Rent, other income and HOA dues are monthly on the sheet; taxes,
/// insurance, maintenance, utilities and other expenses are annual. Counts
/// and most percentages fall back to the calculator defaults when they read
/// as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealForm {
    pub strategy: String,

    pub purchase_price: String,
    pub after_repair_value: String,
    pub rehab_costs: String,
    pub closing_costs_buy: String,
    pub closing_costs_sell: String,

    pub monthly_rent: String,
    pub other_monthly_income: String,
    pub vacancy_rate: String,

    pub property_taxes: String,
    pub insurance: String,
    pub maintenance: String,
    pub property_management: String,
    pub utilities: String,
    pub hoa: String,
    pub other_expenses: String,

    pub down_payment_percent: String,
    pub loan_interest_rate: String,
    pub loan_term_years: String,

    #[serde(rename = "refinanceLTV")]
    pub refinance_ltv: String,
    pub refinance_rate: String,
    pub refinance_term_years: String,

    pub appreciation_rate: String,
    pub rent_growth_rate: String,
    pub hold_period_years: String,
    pub selling_costs_percent: String,

    pub hold_months: String,
    pub hard_money_rate: String,
    pub hard_money_points: String,
}

impl DealForm {
    /// Convert to a [`DealInput`].
    ///
    /// Only the strategy can fail; a blank strategy means Buy & Hold. All
    /// numeric fields go through the lenient parsers and never fail.
    pub fn to_input(&self) -> DealCalcResult<DealInput> {
        let strategy = if self.strategy.trim().is_empty() {
            Strategy::default()
        } else {
            self.strategy.parse::<Strategy>()?
        };
        Ok(self.to_input_with(strategy))
    }

    /// Convert with an explicitly chosen strategy, ignoring the text field.
    pub fn to_input_with(&self, strategy: Strategy) -> DealInput {
        let refi_defaults = RefinanceTerms::default();
        let flip_defaults = FlipAssumptions::default();

        DealInput {
            strategy,
            purchase_price: parse_currency(&self.purchase_price),
            after_repair_value: parse_currency(&self.after_repair_value),
            rehab_costs: parse_currency(&self.rehab_costs),
            closing_costs_buy: parse_currency(&self.closing_costs_buy),
            closing_costs_sell: parse_currency(&self.closing_costs_sell),
            income: DealIncome {
                gross_scheduled_income: annualise(&self.monthly_rent),
                other_income: annualise(&self.other_monthly_income),
                vacancy_rate_pct: parse_percent(&self.vacancy_rate),
            },
            expenses: DealExpenses {
                property_taxes: parse_currency(&self.property_taxes),
                insurance: parse_currency(&self.insurance),
                maintenance: parse_currency(&self.maintenance),
                management_pct: parse_percent(&self.property_management),
                utilities: parse_currency(&self.utilities),
                hoa: annualise(&self.hoa),
                other: parse_currency(&self.other_expenses),
                ..DealExpenses::default()
            },
            financing: FinancingStructure {
                down_payment: DownPayment::Percent(parse_percent(&self.down_payment_percent)),
                rate_pct: parse_percent(&self.loan_interest_rate),
                term_years: parse_count_or(&self.loan_term_years, 30),
                seller_note: None,
                refinance: Some(RefinanceTerms {
                    ltv_pct: parse_percent_or(&self.refinance_ltv, refi_defaults.ltv_pct),
                    rate_pct: parse_percent_or(&self.refinance_rate, refi_defaults.rate_pct),
                    term_years: parse_count_or(&self.refinance_term_years, refi_defaults.term_years),
                }),
            },
            hold: HoldAssumptions {
                appreciation_rate_pct: parse_percent(&self.appreciation_rate),
                hold_period_years: parse_count_or(&self.hold_period_years, 5),
                selling_costs_pct: parse_percent_or(&self.selling_costs_percent, dec!(8)),
                rent_growth_rate_pct: parse_percent(&self.rent_growth_rate),
            },
            flip: FlipAssumptions {
                hold_months: parse_count_or(&self.hold_months, flip_defaults.hold_months),
                hard_money_rate_pct: parse_percent_or(
                    &self.hard_money_rate,
                    flip_defaults.hard_money_rate_pct,
                ),
                hard_money_points_pct: parse_percent_or(
                    &self.hard_money_points,
                    flip_defaults.hard_money_points_pct,
                ),
            },
        }
    }
}

impl TryFrom<&DealForm> for DealInput {
    type Error = DealCalcError;

    fn try_from(form: &DealForm) -> Result<Self, Self::Error> {
        form.to_input()
    }
}

fn annualise(monthly: &str) -> Decimal {
    parse_currency(monthly) * dec!(12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::deal::tests::sample_deal;
    use pretty_assertions::assert_eq;

    fn sample_form() -> DealForm {
        DealForm {
            strategy: "buy-hold".into(),
            purchase_price: "250,000".into(),
            after_repair_value: "$320,000".into(),
            rehab_costs: "40,000".into(),
            closing_costs_buy: "5,000".into(),
            closing_costs_sell: "3,000".into(),
            monthly_rent: "2,200".into(),
            other_monthly_income: "100".into(),
            vacancy_rate: "5".into(),
            property_taxes: "3,000".into(),
            insurance: "1,200".into(),
            maintenance: "1,500".into(),
            property_management: "8".into(),
            utilities: "0".into(),
            hoa: "0".into(),
            other_expenses: "500".into(),
            down_payment_percent: "25".into(),
            loan_interest_rate: "7.5".into(),
            loan_term_years: "30".into(),
            refinance_ltv: "75".into(),
            refinance_rate: "7.0".into(),
            refinance_term_years: "30".into(),
            appreciation_rate: "3".into(),
            rent_growth_rate: "2".into(),
            hold_period_years: "5".into(),
            selling_costs_percent: "8".into(),
            hold_months: "6".into(),
            hard_money_rate: "12".into(),
            hard_money_points: "2".into(),
        }
    }

    #[test]
    fn test_sheet_matches_typed_input() {
        let input = sample_form().to_input().unwrap();
        let mut expected = sample_deal(Strategy::BuyHold);
        expected.financing.refinance = Some(RefinanceTerms::default());
        assert_eq!(input, expected);
    }

    #[test]
    fn test_monthly_fields_annualised() {
        let mut form = sample_form();
        form.hoa = "150".into();
        let input = form.to_input().unwrap();
        assert_eq!(input.income.gross_scheduled_income, dec!(26400));
        assert_eq!(input.income.other_income, dec!(1200));
        assert_eq!(input.expenses.hoa, dec!(1800));
    }

    #[test]
    fn test_blank_sheet_takes_defaults() {
        let input = DealForm::default().to_input().unwrap();
        assert_eq!(input.strategy, Strategy::BuyHold);
        assert_eq!(input.purchase_price, Decimal::ZERO);
        assert_eq!(input.financing.term_years, 30);
        assert_eq!(input.financing.refinance, Some(RefinanceTerms::default()));
        assert_eq!(input.hold.hold_period_years, 5);
        assert_eq!(input.hold.selling_costs_pct, dec!(8));
        assert_eq!(input.flip, FlipAssumptions::default());
        // No purchase price yet, so nothing to analyse
        assert!(crate::strategy::analyze_deal(&input).is_none());
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let mut form = sample_form();
        form.strategy = "wholesale".into();
        assert!(matches!(
            form.to_input(),
            Err(DealCalcError::InvalidInput { .. })
        ));
        let input = form.to_input_with(Strategy::Brrrr);
        assert_eq!(input.strategy, Strategy::Brrrr);
    }

    #[test]
    fn test_deserialises_camel_case() {
        let form: DealForm = serde_json::from_str(
            r#"{"strategy":"fix-flip","purchasePrice":"180,000","refinanceLTV":"70","hardMoneyPoints":"3"}"#,
        )
        .unwrap();
        let input = DealInput::try_from(&form).unwrap();
        assert_eq!(input.strategy, Strategy::FixFlip);
        assert_eq!(input.purchase_price, dec!(180000));
        assert_eq!(input.financing.refinance.unwrap().ltv_pct, dec!(70));
        assert_eq!(input.flip.hard_money_points_pct, dec!(3));
    }
}
