use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financing::interest_only_payment;
use crate::types::{pct, safe_pct, Money, Percent};

use super::deal::DealContext;

/// Hard-money lenders fund this share of the purchase price.
pub const HARD_MONEY_LOAN_TO_COST: Decimal = dec!(0.9);
/// Utilities, lawn and miscellaneous carrying cost per month.
pub const MONTHLY_MISC_HOLDING: Money = dec!(500);
/// Maximum purchase as a share of ARV, before rehab.
pub const RULE_70_FACTOR: Decimal = dec!(0.7);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixFlipResult {
    /// Purchase + rehab + buy-side closing
    pub total_project_cost: Money,
    pub hard_money_loan: Money,
    pub points_cost: Money,
    pub monthly_holding_cost: Money,
    pub total_holding_costs: Money,
    /// Cash the flipper brings to the deal
    pub cash_needed: Money,
    pub sale_price: Money,
    pub selling_costs: Money,
    pub net_sale_proceeds: Money,
    pub gross_profit: Money,
    pub actual_profit: Money,
    pub roi: Percent,
    pub annualized_roi: Percent,
    pub profit_margin: Percent,
    /// ARV * 0.7 - rehab
    pub max_purchase_price_70: Money,
    pub meets_rule_70: bool,
}

pub(crate) fn evaluate(ctx: &DealContext, warnings: &mut Vec<String>) -> FixFlipResult {
    let price = ctx.purchase_price;
    let arv = ctx.after_repair_value;
    let months = Decimal::from(ctx.flip.hold_months);

    let total_project_cost = price + ctx.rehab_costs + ctx.closing_costs_buy;
    let hard_money_loan = price * HARD_MONEY_LOAN_TO_COST;
    let points_cost = hard_money_loan * pct(ctx.flip.hard_money_points_pct);

    let monthly_holding_cost = interest_only_payment(hard_money_loan, ctx.flip.hard_money_rate_pct)
        + ctx.expenses.property_taxes / dec!(12)
        + ctx.expenses.insurance / dec!(12)
        + MONTHLY_MISC_HOLDING;
    let total_holding_costs = monthly_holding_cost * months;

    let cash_needed = (price - hard_money_loan)
        + ctx.rehab_costs
        + ctx.closing_costs_buy
        + points_cost
        + total_holding_costs;

    let selling_costs = arv * pct(ctx.hold.selling_costs_pct);
    let net_sale_proceeds = arv - selling_costs - ctx.closing_costs_sell;

    let gross_profit = net_sale_proceeds - total_project_cost - total_holding_costs - points_cost;
    let actual_profit = net_sale_proceeds - cash_needed - hard_money_loan;

    let roi = safe_pct(actual_profit, cash_needed);
    let annualized_roi = roi / months * dec!(12);

    let max_purchase_price_70 = arv * RULE_70_FACTOR - ctx.rehab_costs;
    let meets_rule_70 = price <= max_purchase_price_70;

    if arv.is_zero() {
        warnings.push("No after-repair value entered; the flip has no sale proceeds".into());
    }
    if !meets_rule_70 {
        warnings.push(format!(
            "Purchase price {price} exceeds the 70% rule maximum of {max_purchase_price_70}"
        ));
    }
    if actual_profit < Decimal::ZERO {
        warnings.push(format!("Flip loses {:.2} at the entered ARV", -actual_profit));
    }

    FixFlipResult {
        total_project_cost,
        hard_money_loan,
        points_cost,
        monthly_holding_cost,
        total_holding_costs,
        cash_needed,
        sale_price: arv,
        selling_costs,
        net_sale_proceeds,
        gross_profit,
        actual_profit,
        roi,
        annualized_roi,
        profit_margin: safe_pct(actual_profit, arv),
        max_purchase_price_70,
        meets_rule_70,
    }
}
