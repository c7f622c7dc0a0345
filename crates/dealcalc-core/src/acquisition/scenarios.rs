use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

use super::analysis::{project_years, roi_metrics, AcquisitionInput, DealStructure, RoiMetrics};

/// What-if variations of the proposed deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioKind {
    Base,
    /// Revenue grows 50% faster, expenses 20% slower
    BestCase,
    /// Revenue grows half as fast, expenses 20% faster
    WorstCase,
    /// A quarter more cash down, borrowed less from the bank
    HigherDownPayment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub label: String,
    pub revenue_growth_pct: Percent,
    pub expense_growth_pct: Percent,
    pub down_payment: Money,
    pub bank_loan: Money,
    pub metrics: RoiMetrics,
    pub five_year_cash_flow: Money,
    pub five_year_roi: Percent,
    pub ten_year_equity: Money,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Base,
        ScenarioKind::BestCase,
        ScenarioKind::WorstCase,
        ScenarioKind::HigherDownPayment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::Base => "Base case",
            ScenarioKind::BestCase => "Best case",
            ScenarioKind::WorstCase => "Worst case",
            ScenarioKind::HigherDownPayment => "Higher down payment",
        }
    }

    fn apply(&self, base: &DealStructure) -> DealStructure {
        let (revenue, expense) = (base.revenue_growth_pct, base.expense_growth_pct);
        match self {
            ScenarioKind::Base => *base,
            ScenarioKind::BestCase => base.with_growth(revenue * dec!(1.5), expense * dec!(0.8)),
            ScenarioKind::WorstCase => base.with_growth(revenue * dec!(0.5), expense * dec!(1.2)),
            ScenarioKind::HigherDownPayment => base.with_down_payment(base.down_payment * dec!(1.25)),
        }
    }
}

pub(crate) fn build_scenarios(input: &AcquisitionInput, base: &DealStructure) -> Vec<Scenario> {
    ScenarioKind::ALL
        .iter()
        .map(|kind| {
            let structure = kind.apply(base);
            let five_years = project_years(input, &structure, 5);
            let (five_year_cash_flow, five_year_roi) = five_years
                .last()
                .map(|y| (y.cumulative_cash_flow, y.cumulative_roi))
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            let ten_year_equity = structure
                .equity_schedule(10)
                .last()
                .map(|row| row.equity)
                .unwrap_or(Decimal::ZERO);

            Scenario {
                kind: *kind,
                label: kind.label().to_string(),
                revenue_growth_pct: structure.revenue_growth_pct,
                expense_growth_pct: structure.expense_growth_pct,
                down_payment: structure.down_payment,
                bank_loan: structure.bank_loan.principal,
                metrics: roi_metrics(input, &structure),
                five_year_cash_flow,
                five_year_roi,
                ten_year_equity,
            }
        })
        .collect()
}
