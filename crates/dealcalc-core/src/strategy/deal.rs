use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::DealCalcError;
use crate::financing::amortization::MAX_TERM_YEARS;
use crate::financing::LoanTerms;
use crate::income::{
    build_income_statement, compute_ratios, DealExpenses, DealIncome, DealRatios,
    IncomeStatement, RatioBasis,
};
use crate::types::{clamp_with_warning, pct, safe_pct, with_metadata, ComputationOutput, Money, Percent};

use super::brrrr::{self, BrrrrResult};
use super::buy_hold::{self, BuyHoldResult};
use super::fix_flip::{self, FixFlipResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    BuyHold,
    FixFlip,
    Brrrr,
}

/// Down payment given either as a share of price or in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownPayment {
    Percent(Percent),
    Amount(Money),
}

/// Cash-out refinance after rehab (BRRRR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinanceTerms {
    /// Loan-to-value on the after-repair value
    pub ltv_pct: Percent,
    pub rate_pct: Percent,
    pub term_years: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingStructure {
    pub down_payment: DownPayment,
    /// Primary mortgage rate
    pub rate_pct: Percent,
    #[serde(default = "default_term_years")]
    pub term_years: u32,
    /// Seller carry-back note; its principal reduces the primary loan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_note: Option<LoanTerms>,
    /// Used by BRRRR only; calculator defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinance: Option<RefinanceTerms>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldAssumptions {
    pub appreciation_rate_pct: Percent,
    pub hold_period_years: u32,
    /// Broker and transfer costs on sale, percent of sale price
    pub selling_costs_pct: Percent,
    pub rent_growth_rate_pct: Percent,
}

/// Short-term hard-money terms for a flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipAssumptions {
    pub hold_months: u32,
    pub hard_money_rate_pct: Percent,
    pub hard_money_points_pct: Percent,
}

/// A residential deal as entered on the analysis sheet. Income and expenses are annual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealInput {
    #[serde(default)]
    pub strategy: Strategy,
    pub purchase_price: Money,
    #[serde(default)]
    pub after_repair_value: Money,
    #[serde(default)]
    pub rehab_costs: Money,
    #[serde(default)]
    pub closing_costs_buy: Money,
    #[serde(default)]
    pub closing_costs_sell: Money,
    pub income: DealIncome,
    #[serde(default)]
    pub expenses: DealExpenses,
    pub financing: FinancingStructure,
    #[serde(default)]
    pub hold: HoldAssumptions,
    #[serde(default)]
    pub flip: FlipAssumptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingSummary {
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_note_monthly_payment: Option<Money>,
    /// Primary plus seller note, twelve months
    pub annual_debt_service: Money,
    pub loan_to_value: Percent,
}

/// Strategy-specific overlay, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyResult {
    BuyHold(BuyHoldResult),
    FixFlip(FixFlipResult),
    Brrrr(BrrrrResult),
}

/// Shared income and financing core plus the strategy overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub income_statement: IncomeStatement,
    pub financing: FinancingSummary,
    pub ratios: DealRatios,
    /// Down payment and buy-side closing costs, plus rehab outside Buy & Hold
    pub total_cash_invested: Money,
    pub strategy: StrategyResult,
}

// ---------------------------------------------------------------------------
// Defaults and parsing
// ---------------------------------------------------------------------------

fn default_term_years() -> u32 {
    30
}

impl Default for RefinanceTerms {
    fn default() -> Self {
        RefinanceTerms {
            ltv_pct: dec!(75),
            rate_pct: dec!(7),
            term_years: 30,
        }
    }
}

impl Default for HoldAssumptions {
    fn default() -> Self {
        HoldAssumptions {
            appreciation_rate_pct: Decimal::ZERO,
            hold_period_years: 5,
            selling_costs_pct: dec!(8),
            rent_growth_rate_pct: Decimal::ZERO,
        }
    }
}

impl Default for FlipAssumptions {
    fn default() -> Self {
        FlipAssumptions {
            hold_months: 6,
            hard_money_rate_pct: dec!(12),
            hard_money_points_pct: dec!(2),
        }
    }
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::BuyHold => "Buy & Hold",
            Strategy::FixFlip => "Fix & Flip",
            Strategy::Brrrr => "BRRRR",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Strategy {
    type Err = DealCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "buyhold" | "buyandhold" | "rental" => Ok(Strategy::BuyHold),
            "fixflip" | "fixandflip" | "flip" => Ok(Strategy::FixFlip),
            "brrrr" => Ok(Strategy::Brrrr),
            _ => Err(DealCalcError::InvalidInput {
                field: "strategy".into(),
                reason: format!("unknown strategy '{s}' (expected buy-hold, fix-flip or brrrr)"),
            }),
        }
    }
}

impl DownPayment {
    /// Dollar down payment on `price`, clamped to [0, price].
    pub fn resolve(&self, price: Money) -> Money {
        let amount = match self {
            DownPayment::Percent(p) => price * pct(*p),
            DownPayment::Amount(a) => *a,
        };
        amount.max(Decimal::ZERO).min(price)
    }
}

// ---------------------------------------------------------------------------
// Shared core
// ---------------------------------------------------------------------------

/// Sanitised inputs and the figures every strategy overlay reads.
pub(crate) struct DealContext {
    pub purchase_price: Money,
    pub after_repair_value: Money,
    pub rehab_costs: Money,
    pub closing_costs_buy: Money,
    pub closing_costs_sell: Money,
    pub income: DealIncome,
    pub expenses: DealExpenses,
    pub statement: IncomeStatement,
    pub down_payment: Money,
    pub primary_loan: LoanTerms,
    pub seller_note: Option<LoanTerms>,
    pub annual_debt_service: Money,
    pub total_cash_invested: Money,
    pub hold: HoldAssumptions,
    pub flip: FlipAssumptions,
    pub refinance: RefinanceTerms,
}

impl DealContext {
    fn build(input: &DealInput, warnings: &mut Vec<String>) -> DealContext {
        let floor = |v: Money| v.max(Decimal::ZERO);
        let purchase_price = input.purchase_price;
        let rehab_costs = floor(input.rehab_costs);
        let closing_costs_buy = floor(input.closing_costs_buy);

        let income = input.income.sanitized(warnings);
        let expenses = input.expenses.sanitized(warnings);
        let statement = build_income_statement(&income, &expenses);

        let down_payment = input.financing.down_payment.resolve(purchase_price);
        let seller_note = input
            .financing
            .seller_note
            .map(|note| note.sanitized("seller note", warnings))
            .filter(|note| note.principal > Decimal::ZERO);
        let note_principal = seller_note.map(|n| n.principal).unwrap_or_default();
        let primary_loan = LoanTerms::new(
            floor(purchase_price - down_payment - note_principal),
            input.financing.rate_pct,
            input.financing.term_years,
        )
        .sanitized("primary loan", warnings);

        let annual_debt_service = primary_loan.annual_debt_service()
            + seller_note.map(|n| n.annual_debt_service()).unwrap_or_default();

        let total_cash_invested = match input.strategy {
            Strategy::BuyHold => down_payment + closing_costs_buy,
            Strategy::FixFlip | Strategy::Brrrr => down_payment + closing_costs_buy + rehab_costs,
        };

        DealContext {
            purchase_price,
            after_repair_value: floor(input.after_repair_value),
            rehab_costs,
            closing_costs_buy,
            closing_costs_sell: floor(input.closing_costs_sell),
            income,
            expenses,
            statement,
            down_payment,
            primary_loan,
            seller_note,
            annual_debt_service,
            total_cash_invested,
            hold: sanitize_hold(&input.hold, warnings),
            flip: sanitize_flip(&input.flip, warnings),
            refinance: input.financing.refinance.unwrap_or_default(),
        }
    }

    /// Primary loan followed by the seller note, if any.
    pub fn loans(&self) -> Vec<LoanTerms> {
        std::iter::once(self.primary_loan).chain(self.seller_note).collect()
    }

    pub fn total_loan_amount(&self) -> Money {
        self.loans().iter().map(|l| l.principal).sum()
    }
}

fn sanitize_hold(hold: &HoldAssumptions, warnings: &mut Vec<String>) -> HoldAssumptions {
    let hold_period_years = if hold.hold_period_years > MAX_TERM_YEARS {
        warnings.push(format!(
            "Hold period of {} years capped at {MAX_TERM_YEARS}",
            hold.hold_period_years
        ));
        MAX_TERM_YEARS
    } else {
        hold.hold_period_years
    };
    HoldAssumptions {
        appreciation_rate_pct: clamp_with_warning(
            "appreciation_rate_pct",
            hold.appreciation_rate_pct,
            dec!(-100),
            dec!(100),
            warnings,
        ),
        hold_period_years,
        selling_costs_pct: clamp_with_warning(
            "selling_costs_pct",
            hold.selling_costs_pct,
            Decimal::ZERO,
            dec!(100),
            warnings,
        ),
        rent_growth_rate_pct: clamp_with_warning(
            "rent_growth_rate_pct",
            hold.rent_growth_rate_pct,
            dec!(-100),
            dec!(100),
            warnings,
        ),
    }
}

fn sanitize_flip(flip: &FlipAssumptions, warnings: &mut Vec<String>) -> FlipAssumptions {
    let hold_months = flip.hold_months.clamp(1, 120);
    if hold_months != flip.hold_months {
        warnings.push(format!(
            "Flip hold of {} months is outside [1, 120]; using {hold_months}",
            flip.hold_months
        ));
    }
    FlipAssumptions {
        hold_months,
        hard_money_rate_pct: clamp_with_warning(
            "hard_money_rate_pct",
            flip.hard_money_rate_pct,
            Decimal::ZERO,
            dec!(100),
            warnings,
        ),
        hard_money_points_pct: clamp_with_warning(
            "hard_money_points_pct",
            flip.hard_money_points_pct,
            Decimal::ZERO,
            dec!(100),
            warnings,
        ),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse a residential deal under its selected strategy.
///
/// Returns `None` until a purchase price has been entered.
pub fn analyze_deal(input: &DealInput) -> Option<ComputationOutput<DealAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.purchase_price <= Decimal::ZERO {
        return None;
    }

    let ctx = DealContext::build(input, &mut warnings);

    let ratios = compute_ratios(
        &ctx.statement,
        &RatioBasis {
            purchase_price: ctx.purchase_price,
            loan_amount: ctx.total_loan_amount(),
            annual_debt_service: ctx.annual_debt_service,
            total_cash_invested: ctx.total_cash_invested,
            annual_gross_rent: ctx.income.gross_scheduled_income,
        },
    );

    let strategy = match input.strategy {
        Strategy::BuyHold => StrategyResult::BuyHold(buy_hold::evaluate(&ctx, &mut warnings)),
        Strategy::FixFlip => StrategyResult::FixFlip(fix_flip::evaluate(&ctx, &mut warnings)),
        Strategy::Brrrr => StrategyResult::Brrrr(brrrr::evaluate(&ctx, &mut warnings)),
    };

    let financing = FinancingSummary {
        down_payment: ctx.down_payment,
        loan_amount: ctx.primary_loan.principal,
        monthly_payment: ctx.primary_loan.monthly_payment(),
        seller_note_monthly_payment: ctx.seller_note.map(|n| n.monthly_payment()),
        annual_debt_service: ctx.annual_debt_service,
        loan_to_value: safe_pct(ctx.total_loan_amount(), ctx.purchase_price),
    };

    push_core_warnings(&ctx, &ratios, &financing, &mut warnings);

    let output = DealAnalysis {
        income_statement: ctx.statement.clone(),
        financing,
        ratios,
        total_cash_invested: ctx.total_cash_invested,
        strategy,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        &format!("{} deal analysis (income approach, monthly amortisation)", input.strategy),
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn push_core_warnings(
    ctx: &DealContext,
    ratios: &DealRatios,
    financing: &FinancingSummary,
    warnings: &mut Vec<String>,
) {
    if ctx.income.gross_scheduled_income.is_zero() {
        warnings.push("No rental income entered; income ratios read as 0".into());
    }
    if ctx.annual_debt_service > Decimal::ZERO && ratios.dscr < dec!(1.25) {
        warnings.push(format!(
            "DSCR of {:.2} is below 1.25x; most lenders will not fund at this coverage",
            ratios.dscr
        ));
    }
    if ratios.annual_cash_flow < Decimal::ZERO {
        warnings.push(format!(
            "Negative cash flow of {:.2} per year after debt service",
            ratios.annual_cash_flow
        ));
    }
    if financing.loan_to_value > dec!(80) {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80%; expect mortgage insurance or a higher rate",
            financing.loan_to_value
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
