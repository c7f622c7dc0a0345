use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    clamp_with_warning, pct, with_metadata, ComputationOutput, Money, Multiple, Percent, Rate,
    ValueRange,
};

use super::multiples::{AdjustmentDetail, EquipmentCondition, Industry, QualitativeFactors};

/// Years of explicit cash flow in the DCF.
pub const DCF_FORECAST_YEARS: u32 = 5;
/// Perpetual growth after the forecast, percent.
pub const TERMINAL_GROWTH_PCT: Percent = dec!(2);
/// The discount rate must exceed terminal growth by at least this much.
pub const MIN_DISCOUNT_SPREAD_PCT: Percent = dec!(1);
/// Revenue rule of thumb: half a year's sales.
pub const REVENUE_RULE_OF_THUMB: Multiple = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A small business being valued. Earnings figures are annual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationInput {
    #[serde(default)]
    pub industry: Industry,
    #[serde(default)]
    pub annual_revenue: Money,
    /// Seller's discretionary earnings
    #[serde(default)]
    pub annual_sde: Money,
    #[serde(default)]
    pub annual_ebitda: Money,
    /// Stated value of furniture, fixtures and equipment
    #[serde(default)]
    pub equipment_value: Money,
    #[serde(default)]
    pub inventory: Money,
    #[serde(default)]
    pub real_estate: Money,
    /// Annual SDE growth over the DCF forecast
    #[serde(default)]
    pub growth_rate_pct: Percent,
    #[serde(default = "default_discount_rate_pct")]
    pub discount_rate_pct: Percent,
    #[serde(default)]
    pub adjustments: QualitativeFactors,
    /// When absent, equipment is counted at its stated value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_condition: Option<EquipmentCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfBreakdown {
    /// SDE for years 1..=5
    pub projected_cash_flows: Vec<Money>,
    pub pv_of_cash_flows: Money,
    pub terminal_value: Money,
    pub pv_of_terminal: Money,
    /// Explicit cash flows plus terminal, both discounted
    pub value: Money,
    pub discount_rate_used: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRange {
    pub low: Money,
    pub high: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationOutput {
    pub industry: Industry,
    pub base_sde_multiple: ValueRange,
    pub base_ebitda_multiple: ValueRange,
    pub adjustments: Vec<AdjustmentDetail>,
    pub total_adjustment: Decimal,
    pub adjustment_multiplier: Multiple,
    /// Base multiples scaled by `adjustment_multiplier`
    pub sde_multiple: ValueRange,
    pub ebitda_multiple: ValueRange,
    pub sde_value: ValueRange,
    pub ebitda_value: ValueRange,
    pub dcf: DcfBreakdown,
    /// Equipment after the condition factor
    pub adjusted_equipment_value: Money,
    pub asset_based_value: Money,
    /// Reported for reference; not part of the recommendation
    pub revenue_rule_of_thumb: Money,
    /// Mean of the positive values among SDE mid, EBITDA mid and DCF
    pub recommended_valuation: Money,
    pub valuation_range: ValuationRange,
}

fn default_discount_rate_pct() -> Percent {
    dec!(15)
}

impl Default for ValuationInput {
    fn default() -> Self {
        ValuationInput {
            industry: Industry::default(),
            annual_revenue: Decimal::ZERO,
            annual_sde: Decimal::ZERO,
            annual_ebitda: Decimal::ZERO,
            equipment_value: Decimal::ZERO,
            inventory: Decimal::ZERO,
            real_estate: Decimal::ZERO,
            growth_rate_pct: Decimal::ZERO,
            discount_rate_pct: default_discount_rate_pct(),
            adjustments: QualitativeFactors::default(),
            equipment_condition: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a business four ways: SDE multiple, EBITDA multiple, five-year DCF
/// on SDE, and asset-based.
///
/// Returns `None` when neither SDE nor EBITDA has been entered.
pub fn value_business(input: &ValuationInput) -> Option<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.annual_sde.is_zero() && input.annual_ebitda.is_zero() {
        return None;
    }

    let base = input.industry.multiples();
    let adjustment_multiplier = input.adjustments.multiplier();
    let sde_multiple = base.sde.scale(adjustment_multiplier);
    let ebitda_multiple = base.ebitda.scale(adjustment_multiplier);

    let sde_value = sde_multiple.scale(input.annual_sde);
    let ebitda_value = ebitda_multiple.scale(input.annual_ebitda);

    let adjusted_equipment_value = match input.equipment_condition {
        Some(condition) => input.equipment_value * condition.factor(),
        None => input.equipment_value,
    };
    let asset_based_value = adjusted_equipment_value + input.inventory + input.real_estate;

    let growth = clamp_with_warning(
        "growth_rate_pct",
        input.growth_rate_pct,
        dec!(-100),
        dec!(100),
        &mut warnings,
    );
    let dcf = discounted_sde(input.annual_sde, growth, input.discount_rate_pct, &mut warnings);

    let recommended_valuation = mean_of_positive(&[sde_value.mid, ebitda_value.mid, dcf.value]);
    let valuation_range = ValuationRange {
        low: [sde_value.low, ebitda_value.low, asset_based_value]
            .into_iter()
            .filter(|v| *v > Decimal::ZERO)
            .min()
            .unwrap_or(Decimal::ZERO),
        high: sde_value.high.max(ebitda_value.high).max(dcf.value),
    };

    if input.annual_sde < Decimal::ZERO || input.annual_ebitda < Decimal::ZERO {
        warnings.push("Negative earnings entered; earnings-based values are excluded from the recommendation".into());
    }
    if input.annual_sde > Decimal::ZERO
        && input.annual_ebitda > Decimal::ZERO
        && input.annual_ebitda > input.annual_sde
    {
        warnings.push("EBITDA exceeds SDE; SDE normally adds back the owner's compensation".into());
    }
    if adjustment_multiplier != Decimal::ONE {
        log::debug!("multiples scaled by {adjustment_multiplier} for qualitative factors");
    }

    let output = ValuationOutput {
        industry: input.industry,
        base_sde_multiple: base.sde,
        base_ebitda_multiple: base.ebitda,
        adjustments: input.adjustments.details(),
        total_adjustment: input.adjustments.total_adjustment(),
        adjustment_multiplier,
        sde_multiple,
        ebitda_multiple,
        sde_value,
        ebitda_value,
        dcf,
        adjusted_equipment_value,
        asset_based_value,
        revenue_rule_of_thumb: input.annual_revenue * REVENUE_RULE_OF_THUMB,
        recommended_valuation,
        valuation_range,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        &format!("{} business valuation (SDE, EBITDA, DCF, asset-based)", input.industry),
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Five years of SDE grown at `growth_pct`, discounted at `discount_pct`,
/// plus a Gordon terminal value at 2% growth.
///
/// The discount rate is raised to terminal growth plus one point when it
/// would otherwise make the terminal value explode or go negative.
pub fn discounted_sde(
    annual_sde: Money,
    growth_pct: Percent,
    discount_pct: Percent,
    warnings: &mut Vec<String>,
) -> DcfBreakdown {
    let floor = TERMINAL_GROWTH_PCT + MIN_DISCOUNT_SPREAD_PCT;
    let discount_pct = if discount_pct < floor {
        warnings.push(format!(
            "Discount rate of {discount_pct}% does not exceed terminal growth of {TERMINAL_GROWTH_PCT}% by a point; using {floor}%"
        ));
        floor
    } else {
        discount_pct
    };
    let d: Rate = pct(discount_pct);
    let g: Rate = pct(growth_pct);
    let tg: Rate = pct(TERMINAL_GROWTH_PCT);

    let mut cash_flow = annual_sde;
    let mut projected_cash_flows = Vec::with_capacity(DCF_FORECAST_YEARS as usize);
    let mut pv_of_cash_flows = Decimal::ZERO;
    for year in 1..=DCF_FORECAST_YEARS {
        cash_flow *= Decimal::ONE + g;
        projected_cash_flows.push(cash_flow);
        pv_of_cash_flows += discount(cash_flow, d, year);
    }

    let terminal_value = cash_flow * (Decimal::ONE + tg) / (d - tg);
    let pv_of_terminal = discount(terminal_value, d, DCF_FORECAST_YEARS);

    DcfBreakdown {
        projected_cash_flows,
        pv_of_cash_flows,
        terminal_value,
        pv_of_terminal,
        value: pv_of_cash_flows + pv_of_terminal,
        discount_rate_used: discount_pct,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn discount(amount: Money, rate: Rate, years: u32) -> Money {
    match (Decimal::ONE + rate).checked_powi(i64::from(years)) {
        Some(factor) if !factor.is_zero() => amount / factor,
        _ => Decimal::ZERO,
    }
}

fn mean_of_positive(values: &[Money]) -> Money {
    let positive: Vec<Money> = values.iter().copied().filter(|v| *v > Decimal::ZERO).collect();
    if positive.is_empty() {
        return Decimal::ZERO;
    }
    positive.iter().copied().sum::<Money>() / Decimal::from(positive.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
