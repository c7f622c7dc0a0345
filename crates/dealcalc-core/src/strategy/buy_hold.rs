use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::income::build_income_statement;
use crate::projection::{build_equity_schedule, sale_proceeds, EquityScheduleInput, EquityScheduleRow};
use crate::time_value::{solve_irr_detailed, total_roi, DEFAULT_IRR_GUESS};
use crate::types::{pct, safe_div, Money, Percent};

use super::deal::DealContext;

/// The year-1 operating expense total, management and reserves included,
/// grows 2% a year from year 2 on.
pub const EXPENSE_INFLATION_PCT: Decimal = dec!(2);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyHoldResult {
    pub hold_period_years: u32,
    pub equity_schedule: Vec<EquityScheduleRow>,
    /// Cash flow after debt service for years 1..=n, before any sale
    pub annual_cash_flows: Vec<Money>,
    /// `[-cash invested, CF_1, ..., CF_n + sale proceeds]`, the IRR input
    pub cash_flow_vector: Vec<Money>,
    pub exit_value: Money,
    pub exit_loan_balance: Money,
    pub exit_equity: Money,
    pub sale_proceeds: Money,
    pub irr: Percent,
    /// False when the IRR is a best-effort estimate
    pub irr_converged: bool,
    pub total_roi: Percent,
    /// Total distributions over cash invested
    pub equity_multiple: Decimal,
}

pub(crate) fn evaluate(ctx: &DealContext, warnings: &mut Vec<String>) -> BuyHoldResult {
    let mut hold = ctx.hold.hold_period_years;
    if hold == 0 {
        warnings.push("Hold period of 0 years; modelling a 1-year hold".into());
        hold = 1;
    }

    let loans = ctx.loans();
    let schedule = build_equity_schedule(&EquityScheduleInput {
        initial_value: ctx.purchase_price,
        growth_rate_pct: ctx.hold.appreciation_rate_pct,
        hold_period_years: hold,
        loans: loans.clone(),
    });

    let rent_growth = Decimal::ONE + pct(ctx.hold.rent_growth_rate_pct);
    let inflation = Decimal::ONE + pct(EXPENSE_INFLATION_PCT);
    let base_expenses = ctx.statement.total_operating_expenses;
    let mut income_factor = Decimal::ONE;
    let mut expense_factor = Decimal::ONE;
    let mut annual_cash_flows = Vec::with_capacity(hold as usize);

    for year in 1..=hold {
        income_factor *= rent_growth;
        if year > 1 {
            expense_factor *= inflation;
        }
        let effective_gross_income = build_income_statement(&ctx.income.grown(income_factor), &ctx.expenses)
            .effective_gross_income;
        let net_operating_income = effective_gross_income - base_expenses * expense_factor;
        // A loan shorter than the hold stops costing anything once repaid
        let debt_service: Money = loans
            .iter()
            .filter(|l| l.term_years >= year)
            .map(|l| l.annual_debt_service())
            .sum();
        annual_cash_flows.push(net_operating_income - debt_service);
    }

    let proceeds = sale_proceeds(&schedule.exit, ctx.hold.selling_costs_pct);
    let invested = ctx.total_cash_invested;

    let mut cash_flow_vector = Vec::with_capacity(hold as usize + 1);
    cash_flow_vector.push(-invested);
    cash_flow_vector.extend(annual_cash_flows.iter().copied());
    if let Some(last) = cash_flow_vector.last_mut() {
        *last += proceeds;
    }

    let irr = solve_irr_detailed(&cash_flow_vector, DEFAULT_IRR_GUESS);
    if !irr.converged {
        warnings.push(format!(
            "IRR did not converge; {:.2}% is a best-effort estimate",
            irr.rate_pct
        ));
    }

    let distributions = &cash_flow_vector[1..];
    let total_distributed: Money = distributions.iter().copied().sum();
    if invested <= Decimal::ZERO {
        warnings.push("No cash invested; total ROI and equity multiple read as 0".into());
    }

    BuyHoldResult {
        hold_period_years: hold,
        equity_schedule: schedule.rows,
        annual_cash_flows,
        exit_value: schedule.exit.exit_value,
        exit_loan_balance: schedule.exit.exit_debt,
        exit_equity: schedule.exit.exit_equity,
        sale_proceeds: proceeds,
        irr: irr.rate_pct,
        irr_converged: irr.converged,
        total_roi: total_roi(invested, distributions).unwrap_or_default(),
        equity_multiple: safe_div(total_distributed, invested),
        cash_flow_vector,
    }
}
