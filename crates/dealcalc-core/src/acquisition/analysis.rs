use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::financing::amortization::MAX_TERM_YEARS;
use crate::financing::LoanTerms;
use crate::income::DscrBand;
use crate::projection::{build_equity_schedule, EquityScheduleInput, EquityScheduleRow, ExitPosition};
use crate::time_value::{payback_period, solve_irr_detailed, DEFAULT_IRR_GUESS};
use crate::types::{
    clamp_with_warning, pct, safe_div, safe_pct, with_metadata, ComputationOutput, Money, Multiple,
    Percent,
};
use crate::valuation::{value_business, Industry, Sector, ValuationInput};

use super::scenarios::{build_scenarios, Scenario};

/// Years reported in the projection table.
pub const PROJECTION_YEARS: [u32; 5] = [1, 3, 5, 7, 10];

/// A valuation within this many percent of the asking price reads as fair.
pub const FAIR_PRICE_BAND_PCT: Percent = dec!(10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A business offered for sale and the proposed way of paying for it.
///
/// Whatever the down payment and seller note leave of the asking price is
/// borrowed from the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub industry: Industry,
    /// Picks the price-check multiples; derived from `industry` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    pub asking_price: Money,
    pub down_payment: Money,
    /// Principal carried back by the seller
    pub seller_financing: Money,
    pub seller_rate_pct: Percent,
    pub seller_term_years: u32,
    pub bank_rate_pct: Percent,
    pub bank_term_years: u32,
    pub annual_revenue: Money,
    pub annual_sde: Money,
    pub annual_ebitda: Money,
    /// Cash left in the business at close
    pub working_capital: Money,
    pub closing_costs: Money,
    /// Furniture, fixtures and equipment
    pub ffe_value: Money,
    pub inventory_value: Money,
    pub annual_capex: Money,
    /// Salary the buyer draws before counting cash flow
    pub buyer_salary: Money,
    pub revenue_growth_pct: Percent,
    pub expense_growth_pct: Percent,
    pub exit_timeline_years: u32,
}

impl AcquisitionInput {
    pub fn sector(&self) -> Sector {
        self.sector.unwrap_or_else(|| Sector::from(self.industry))
    }
}

impl Default for AcquisitionInput {
    fn default() -> Self {
        AcquisitionInput {
            business_name: None,
            industry: Industry::default(),
            sector: None,
            asking_price: dec!(500000),
            down_payment: dec!(125000),
            seller_financing: Decimal::ZERO,
            seller_rate_pct: dec!(6),
            seller_term_years: 5,
            bank_rate_pct: dec!(7.5),
            bank_term_years: 10,
            annual_revenue: dec!(1000000),
            annual_sde: dec!(200000),
            annual_ebitda: dec!(180000),
            working_capital: dec!(25000),
            closing_costs: dec!(15000),
            ffe_value: dec!(100000),
            inventory_value: dec!(50000),
            annual_capex: dec!(10000),
            buyer_salary: Decimal::ZERO,
            revenue_growth_pct: dec!(5),
            expense_growth_pct: dec!(3),
            exit_timeline_years: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtService {
    pub bank_loan: Money,
    pub seller_note: Money,
    pub monthly_bank_payment: Money,
    pub monthly_seller_payment: Money,
    pub total_monthly_payment: Money,
    pub annual_debt_service: Money,
}

/// First-year cash returns, before any growth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiMetrics {
    /// Down payment, working capital and closing costs
    pub total_cash_invested: Money,
    /// SDE less debt service, capex and the buyer's salary
    pub annual_pre_tax_cash_flow: Money,
    pub cash_on_cash: Percent,
    /// SDE over annual debt service
    pub dscr: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr_band: Option<DscrBand>,
    /// Cash invested over first-year cash flow; absent when cash flow is not positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_years: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub revenue: Money,
    pub sde: Money,
    pub capex: Money,
    pub debt_service: Money,
    pub cash_flow: Money,
    /// Cash flow summed over every year up to and including this one
    pub cumulative_cash_flow: Money,
    pub cumulative_roi: Percent,
    /// Cumulative ROI spread evenly over the years
    pub annualized_roi: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    /// The method values the business well above the asking price
    Undervalued,
    Fair,
    Overvalued,
}

/// One valuation method set against the asking price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationCheck {
    pub method: String,
    pub value: Money,
    /// (value - asking price) / asking price
    pub variance_pct: Percent,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpliedMultiples {
    pub price_to_sde: Multiple,
    pub price_to_ebitda: Multiple,
    pub price_to_revenue: Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakEven {
    pub sde_margin_pct: Percent,
    /// Revenue at which SDE just covers debt service, capex and salary
    pub break_even_revenue: Money,
    /// How far revenue can fall before reaching break-even
    pub safety_margin_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub industry: Industry,
    pub debt_service: DebtService,
    pub roi: RoiMetrics,
    /// Payback on the projected, growing cash flows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_payback_years: Option<Decimal>,
    pub projections: Vec<ProjectionYear>,
    pub equity_schedule: Vec<EquityScheduleRow>,
    pub exit: ExitPosition,
    /// IRR on cash invested, yearly cash flows and the exit equity
    pub exit_irr: Percent,
    pub exit_irr_converged: bool,
    pub valuation_checks: Vec<ValuationCheck>,
    pub recommended_valuation: Money,
    pub implied_multiples: ImpliedMultiples,
    pub break_even: BreakEven,
    pub scenarios: Vec<Scenario>,
}

/// Sanitised price, loans and growth rates for one way of structuring the deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DealStructure {
    pub asking_price: Money,
    pub down_payment: Money,
    pub bank_loan: LoanTerms,
    pub seller_note: LoanTerms,
    pub revenue_growth_pct: Percent,
    pub expense_growth_pct: Percent,
}

impl DealStructure {
    fn resolve(input: &AcquisitionInput, warnings: &mut Vec<String>) -> DealStructure {
        let price = input.asking_price;
        let down_payment =
            clamp_with_warning("down_payment", input.down_payment, Decimal::ZERO, price, warnings);
        let seller_financing = clamp_with_warning(
            "seller_financing",
            input.seller_financing,
            Decimal::ZERO,
            price - down_payment,
            warnings,
        );
        let seller_note = LoanTerms::new(
            seller_financing,
            input.seller_rate_pct,
            input.seller_term_years,
        )
        .sanitized("Seller note", warnings);
        let bank_loan = LoanTerms::new(
            price - down_payment - seller_financing,
            input.bank_rate_pct,
            input.bank_term_years,
        )
        .sanitized("Bank loan", warnings);

        DealStructure {
            asking_price: price,
            down_payment,
            bank_loan,
            seller_note,
            revenue_growth_pct: clamp_with_warning(
                "revenue_growth_pct",
                input.revenue_growth_pct,
                dec!(-100),
                dec!(100),
                warnings,
            ),
            expense_growth_pct: clamp_with_warning(
                "expense_growth_pct",
                input.expense_growth_pct,
                dec!(-100),
                dec!(100),
                warnings,
            ),
        }
    }

    /// Same deal with a different down payment; the bank loan absorbs the change.
    pub(crate) fn with_down_payment(&self, down_payment: Money) -> DealStructure {
        let down_payment = down_payment
            .max(Decimal::ZERO)
            .min(self.asking_price - self.seller_note.principal);
        DealStructure {
            down_payment,
            bank_loan: LoanTerms {
                principal: self.asking_price - down_payment - self.seller_note.principal,
                ..self.bank_loan
            },
            ..*self
        }
    }

    pub(crate) fn with_growth(&self, revenue_growth_pct: Percent, expense_growth_pct: Percent) -> DealStructure {
        DealStructure {
            revenue_growth_pct,
            expense_growth_pct,
            ..*self
        }
    }

    /// Bank loan first, then the seller note.
    pub(crate) fn loans(&self) -> Vec<LoanTerms> {
        vec![self.bank_loan, self.seller_note]
    }

    /// Debt service in `year` (1-based); a loan stops costing once its term ends.
    pub(crate) fn debt_service_in_year(&self, year: u32) -> Money {
        self.loans()
            .iter()
            .filter(|l| l.term_years >= year)
            .map(|l| l.annual_debt_service())
            .sum()
    }

    pub(crate) fn equity_schedule(&self, years: u32) -> Vec<EquityScheduleRow> {
        build_equity_schedule(&EquityScheduleInput {
            initial_value: self.asking_price,
            growth_rate_pct: self.revenue_growth_pct,
            hold_period_years: years,
            loans: self.loans(),
        })
        .rows
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Analyse the purchase of a business financed by a bank loan and an
/// optional seller note.
///
/// Returns `None` until an asking price and a positive SDE are entered.
pub fn analyze_acquisition(
    input: &AcquisitionInput,
) -> Option<ComputationOutput<AcquisitionAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.asking_price <= Decimal::ZERO || input.annual_sde <= Decimal::ZERO {
        return None;
    }

    let structure = DealStructure::resolve(input, &mut warnings);

    let mut exit_years = input.exit_timeline_years;
    if exit_years == 0 {
        warnings.push("Exit timeline of 0 years; modelling a 1-year hold".into());
        exit_years = 1;
    } else if exit_years > MAX_TERM_YEARS {
        warnings.push(format!(
            "Exit timeline of {exit_years} years capped at {MAX_TERM_YEARS}"
        ));
        exit_years = MAX_TERM_YEARS;
    }

    // Debt service
    let monthly_bank_payment = structure.bank_loan.monthly_payment();
    let monthly_seller_payment = structure.seller_note.monthly_payment();
    let debt_service = DebtService {
        bank_loan: structure.bank_loan.principal,
        seller_note: structure.seller_note.principal,
        monthly_bank_payment,
        monthly_seller_payment,
        total_monthly_payment: monthly_bank_payment + monthly_seller_payment,
        annual_debt_service: structure.debt_service_in_year(1),
    };

    // First-year returns
    let roi = roi_metrics(input, &structure);
    if roi.annual_pre_tax_cash_flow < Decimal::ZERO {
        warnings.push("Pre-tax cash flow is negative after debt service, capex and salary".into());
    }
    if let Some(band) = roi.dscr_band {
        if band != DscrBand::Bankable {
            warnings.push(format!(
                "DSCR of {:.2} is below the 1.25 lenders typically require",
                roi.dscr
            ));
        }
    }

    // Projections
    let horizon = exit_years.max(PROJECTION_YEARS[PROJECTION_YEARS.len() - 1]);
    let all_years = project_years(input, &structure, horizon);
    let cash_flows: Vec<Money> = all_years.iter().map(|y| y.cash_flow).collect();
    let projected_payback_years = payback_period(roi.total_cash_invested, &cash_flows);
    let projections: Vec<ProjectionYear> = all_years
        .iter()
        .filter(|y| PROJECTION_YEARS.contains(&y.year))
        .cloned()
        .collect();

    // Equity and exit
    let schedule = build_equity_schedule(&EquityScheduleInput {
        initial_value: structure.asking_price,
        growth_rate_pct: structure.revenue_growth_pct,
        hold_period_years: exit_years,
        loans: structure.loans(),
    });
    let mut irr_flows = Vec::with_capacity(exit_years as usize + 1);
    irr_flows.push(-roi.total_cash_invested);
    irr_flows.extend(cash_flows.iter().take(exit_years as usize).copied());
    if let Some(last) = irr_flows.last_mut() {
        *last += schedule.exit.exit_equity;
    }
    let irr = solve_irr_detailed(&irr_flows, DEFAULT_IRR_GUESS);
    if !irr.converged {
        warnings.push("Exit IRR did not converge; reported value is a best estimate".into());
    }

    // Valuation cross-check
    let (valuation_checks, recommended_valuation) = cross_check(input, &structure, &mut warnings);

    let implied_multiples = ImpliedMultiples {
        price_to_sde: safe_div(structure.asking_price, input.annual_sde),
        price_to_ebitda: safe_div(structure.asking_price, input.annual_ebitda),
        price_to_revenue: safe_div(structure.asking_price, input.annual_revenue),
    };

    let break_even = break_even(input, debt_service.annual_debt_service);
    if input.annual_revenue <= Decimal::ZERO {
        warnings.push("No revenue entered; break-even revenue not computed".into());
    }

    let scenarios = build_scenarios(input, &structure);

    let output = AcquisitionAnalysis {
        business_name: input.business_name.clone(),
        industry: input.industry,
        debt_service,
        roi,
        projected_payback_years,
        projections,
        equity_schedule: schedule.rows,
        exit: schedule.exit,
        exit_irr: irr.rate_pct,
        exit_irr_converged: irr.converged,
        valuation_checks,
        recommended_valuation,
        implied_multiples,
        break_even,
        scenarios,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        "Business acquisition analysis (bank loan, seller note, SDE cash flow)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn roi_metrics(input: &AcquisitionInput, structure: &DealStructure) -> RoiMetrics {
    let total_cash_invested = structure.down_payment + input.working_capital + input.closing_costs;
    let annual_debt_service = structure.debt_service_in_year(1);
    let annual_pre_tax_cash_flow =
        input.annual_sde - annual_debt_service - input.annual_capex - input.buyer_salary;
    let dscr = safe_div(input.annual_sde, annual_debt_service);

    RoiMetrics {
        total_cash_invested,
        annual_pre_tax_cash_flow,
        cash_on_cash: safe_pct(annual_pre_tax_cash_flow, total_cash_invested),
        dscr,
        dscr_band: (annual_debt_service > Decimal::ZERO).then(|| DscrBand::classify(dscr)),
        payback_years: (annual_pre_tax_cash_flow > Decimal::ZERO)
            .then(|| total_cash_invested / annual_pre_tax_cash_flow),
    }
}

/// Years 1..=`years`. Revenue and SDE grow at the revenue rate, capex at the
/// expense rate, both compounded from year 1; the buyer's salary is flat.
pub(crate) fn project_years(
    input: &AcquisitionInput,
    structure: &DealStructure,
    years: u32,
) -> Vec<ProjectionYear> {
    let invested = structure.down_payment + input.working_capital + input.closing_costs;
    let mut cumulative_cash_flow = Decimal::ZERO;
    let mut rows = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let revenue_factor = grow(structure.revenue_growth_pct, year);
        let revenue = input.annual_revenue * revenue_factor;
        let sde = input.annual_sde * revenue_factor;
        let capex = input.annual_capex * grow(structure.expense_growth_pct, year);
        let debt_service = structure.debt_service_in_year(year);
        let cash_flow = sde - debt_service - capex - input.buyer_salary;
        cumulative_cash_flow += cash_flow;
        let cumulative_roi = safe_pct(cumulative_cash_flow, invested);

        rows.push(ProjectionYear {
            year,
            revenue,
            sde,
            capex,
            debt_service,
            cash_flow,
            cumulative_cash_flow,
            cumulative_roi,
            annualized_roi: cumulative_roi / Decimal::from(year),
        });
    }
    rows
}

fn cross_check(
    input: &AcquisitionInput,
    structure: &DealStructure,
    warnings: &mut Vec<String>,
) -> (Vec<ValuationCheck>, Money) {
    let valuation = value_business(&ValuationInput {
        industry: input.industry,
        annual_revenue: input.annual_revenue,
        annual_sde: input.annual_sde,
        annual_ebitda: input.annual_ebitda,
        equipment_value: input.ffe_value,
        inventory: input.inventory_value,
        growth_rate_pct: structure.revenue_growth_pct,
        ..ValuationInput::default()
    });
    let Some(valuation) = valuation else {
        return (Vec::new(), Decimal::ZERO);
    };
    warnings.extend(valuation.warnings);
    let v = valuation.result;

    let point = input.sector().multiples();
    let candidates = [
        ("SDE multiple", input.annual_sde * point.sde),
        ("EBITDA multiple", input.annual_ebitda * point.ebitda),
        ("Revenue multiple", input.annual_revenue * point.revenue),
        ("Asset-based", v.asset_based_value),
        ("Discounted SDE", v.dcf.value),
    ];
    let checks = candidates
        .into_iter()
        .filter(|(_, value)| *value > Decimal::ZERO)
        .map(|(method, value)| {
            let variance_pct = safe_pct(value - structure.asking_price, structure.asking_price);
            ValuationCheck {
                method: method.to_string(),
                value,
                variance_pct,
                assessment: assess(variance_pct),
            }
        })
        .collect();

    let premium = safe_pct(
        structure.asking_price - v.recommended_valuation,
        v.recommended_valuation,
    );
    if premium > FAIR_PRICE_BAND_PCT {
        warnings.push(format!(
            "Asking price is {premium:.1}% above the recommended valuation of {:.0}",
            v.recommended_valuation
        ));
    }
    (checks, v.recommended_valuation)
}

fn assess(variance_pct: Percent) -> Assessment {
    if variance_pct > FAIR_PRICE_BAND_PCT {
        Assessment::Undervalued
    } else if variance_pct < -FAIR_PRICE_BAND_PCT {
        Assessment::Overvalued
    } else {
        Assessment::Fair
    }
}

fn break_even(input: &AcquisitionInput, annual_debt_service: Money) -> BreakEven {
    let margin = safe_div(input.annual_sde, input.annual_revenue);
    let fixed = annual_debt_service + input.annual_capex + input.buyer_salary;
    let break_even_revenue = safe_div(fixed, margin);
    let safety_margin_pct = if input.annual_revenue > Decimal::ZERO && margin > Decimal::ZERO {
        safe_pct(input.annual_revenue - break_even_revenue, input.annual_revenue)
    } else {
        Decimal::ZERO
    };
    BreakEven {
        sde_margin_pct: margin * dec!(100),
        break_even_revenue,
        safety_margin_pct,
    }
}

fn grow(rate_pct: Percent, years: u32) -> Decimal {
    (Decimal::ONE + pct(rate_pct))
        .checked_powi(i64::from(years))
        .unwrap_or(Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn analyse(input: &AcquisitionInput) -> ComputationOutput<AcquisitionAnalysis> {
        analyze_acquisition(input).unwrap()
    }

    #[test]
    fn test_default_debt_service() {
        let out = analyse(&AcquisitionInput::default()).result;
        // 500k - 125k down = 375k bank loan at 7.5% over 10 years
        assert_eq!(out.debt_service.bank_loan, dec!(375000));
        assert_eq!(out.debt_service.seller_note, Decimal::ZERO);
        assert!(
            (out.debt_service.monthly_bank_payment - dec!(4451.32)).abs() < dec!(0.01),
            "Expected ~4451.32, got {}",
            out.debt_service.monthly_bank_payment
        );
        assert!((out.debt_service.annual_debt_service - dec!(53415.80)).abs() < dec!(0.01));
    }

    #[test]
    fn test_default_roi() {
        let roi = analyse(&AcquisitionInput::default()).result.roi;
        // 125k + 25k + 15k
        assert_eq!(roi.total_cash_invested, dec!(165000));
        // 200,000 - 53,415.80 - 10,000
        assert!((roi.annual_pre_tax_cash_flow - dec!(136584.20)).abs() < dec!(0.01));
        assert!((roi.cash_on_cash - dec!(82.778)).abs() < dec!(0.001));
        assert!((roi.dscr - dec!(3.744)).abs() < dec!(0.001));
        assert_eq!(roi.dscr_band, Some(DscrBand::Bankable));
        assert!((roi.payback_years.unwrap() - dec!(1.208)).abs() < dec!(0.001));
    }

    #[test]
    fn test_projection_rows() {
        let out = analyse(&AcquisitionInput::default()).result;
        let years: Vec<u32> = out.projections.iter().map(|p| p.year).collect();
        assert_eq!(years, PROJECTION_YEARS.to_vec());

        // Year 1 already carries one year of growth
        let first = &out.projections[0];
        assert_eq!(first.revenue, dec!(1050000));
        assert_eq!(first.sde, dec!(210000));
        assert_eq!(first.capex, dec!(10300));
        assert!((first.cash_flow - dec!(146284.20)).abs() < dec!(0.01));
        assert_eq!(first.cumulative_cash_flow, first.cash_flow);
    }

    #[test]
    fn test_cumulative_counts_unreported_years() {
        let input = AcquisitionInput::default();
        let out = analyse(&input).result;
        let mut w = Vec::new();
        let structure = DealStructure::resolve(&input, &mut w);
        let all = project_years(&input, &structure, 3);
        let sum: Money = all.iter().map(|y| y.cash_flow).sum();
        // Row for year 3 includes year 2, which is not in the table
        assert_eq!(out.projections[1].year, 3);
        assert_eq!(out.projections[1].cumulative_cash_flow, sum);
        assert_eq!(
            out.projections[1].annualized_roi,
            out.projections[1].cumulative_roi / dec!(3)
        );
    }

    #[test]
    fn test_seller_note_stops_after_term() {
        let input = AcquisitionInput {
            seller_financing: dec!(100000),
            seller_term_years: 3,
            ..AcquisitionInput::default()
        };
        let out = analyse(&input).result;
        assert_eq!(out.debt_service.bank_loan, dec!(275000));
        assert_eq!(out.debt_service.seller_note, dec!(100000));
        let seller_annual = out.debt_service.monthly_seller_payment * dec!(12);
        let bank_annual = out.debt_service.monthly_bank_payment * dec!(12);
        assert_eq!(out.projections[1].debt_service, bank_annual + seller_annual);
        // Year 5 is past the 3-year note
        assert_eq!(out.projections[2].debt_service, bank_annual);
        assert_eq!(out.equity_schedule[0].loan_balances.len(), 2);
    }

    #[test]
    fn test_bank_loan_repaid_at_exit() {
        let out = analyse(&AcquisitionInput::default()).result;
        assert_eq!(out.exit.year_index, 10);
        assert!(out.exit.exit_debt < dec!(0.01), "got {}", out.exit.exit_debt);
        // 500,000 * 1.05^10
        assert!((out.exit.exit_value - dec!(814447.31)).abs() < dec!(0.01));
        assert!(out.exit_irr_converged);
        assert!(out.exit_irr > dec!(50));
    }

    #[test]
    fn test_valuation_checks() {
        let out = analyse(&AcquisitionInput::default()).result;
        let find = |m: &str| {
            out.valuation_checks
                .iter()
                .find(|c| c.method == m)
                .unwrap()
                .clone()
        };
        // Services: 3.0x SDE = 600k, 20% above the price
        let sde = find("SDE multiple");
        assert_eq!(sde.value, dec!(600000));
        assert_eq!(sde.variance_pct, dec!(20));
        assert_eq!(sde.assessment, Assessment::Undervalued);
        // 5.0x EBITDA and 0.8x revenue
        assert_eq!(find("EBITDA multiple").value, dec!(900000));
        let revenue = find("Revenue multiple");
        assert_eq!(revenue.value, dec!(800000));
        assert_eq!(revenue.variance_pct, dec!(60));
        assert_eq!(revenue.assessment, Assessment::Undervalued);
        // FF&E + inventory = 150k
        let assets = find("Asset-based");
        assert_eq!(assets.value, dec!(150000));
        assert_eq!(assets.assessment, Assessment::Overvalued);
        assert!(out.recommended_valuation > dec!(500000));
    }

    #[test]
    fn test_price_checks_follow_the_sector() {
        let checks = |sector: Option<Sector>, industry: Industry| {
            let input = AcquisitionInput {
                industry,
                sector,
                ..AcquisitionInput::default()
            };
            analyse(&input).result.valuation_checks
        };
        let value_of = |list: &[ValuationCheck], m: &str| {
            list.iter().find(|c| c.method == m).map(|c| c.value).unwrap()
        };
        // SDE 200k, EBITDA 180k, revenue 1M
        for sector in Sector::ALL {
            let m = sector.multiples();
            let list = checks(Some(sector), Industry::Services);
            assert_eq!(value_of(&list, "SDE multiple"), dec!(200000) * m.sde, "{sector:?}");
            assert_eq!(value_of(&list, "EBITDA multiple"), dec!(180000) * m.ebitda, "{sector:?}");
            assert_eq!(value_of(&list, "Revenue multiple"), dec!(1000000) * m.revenue, "{sector:?}");
        }

        let tech = checks(None, Industry::Technology);
        assert_eq!(value_of(&tech, "Revenue multiple"), dec!(1500000));
        let real_estate = checks(Some(Sector::RealEstate), Industry::Services);
        assert_eq!(value_of(&real_estate, "Revenue multiple"), dec!(500000));
        // No point multiple for lawn care: falls back to Other
        let lawn = checks(None, Industry::LawnCare);
        assert_eq!(value_of(&lawn, "SDE multiple"), dec!(500000));
        assert_eq!(value_of(&lawn, "EBITDA multiple"), dec!(720000));
    }

    #[test]
    fn test_implied_multiples_and_break_even() {
        let out = analyse(&AcquisitionInput::default()).result;
        assert_eq!(out.implied_multiples.price_to_sde, dec!(2.5));
        assert_eq!(out.implied_multiples.price_to_revenue, dec!(0.5));
        assert_eq!(out.break_even.sde_margin_pct, dec!(20));
        // (53,415.80 + 10,000) / 0.20
        assert!((out.break_even.break_even_revenue - dec!(317078.98)).abs() < dec!(0.01));
        assert!((out.break_even.safety_margin_pct - dec!(68.292)).abs() < dec!(0.001));
    }

    #[test]
    fn test_thin_coverage_warns() {
        let input = AcquisitionInput {
            annual_sde: dec!(60000),
            ..AcquisitionInput::default()
        };
        let out = analyse(&input);
        assert!(out.warnings.iter().any(|w| w.contains("DSCR")));
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
        assert_eq!(out.result.roi.payback_years, None);
    }

    #[test]
    fn test_down_payment_clamped_to_price() {
        let input = AcquisitionInput {
            down_payment: dec!(600000),
            ..AcquisitionInput::default()
        };
        let out = analyse(&input);
        assert_eq!(out.result.debt_service.bank_loan, Decimal::ZERO);
        assert_eq!(out.result.roi.dscr_band, None);
        assert!(out.warnings.iter().any(|w| w.contains("down_payment")));
    }

    #[test]
    fn test_requires_price_and_sde() {
        let mut input = AcquisitionInput::default();
        input.annual_sde = Decimal::ZERO;
        assert!(analyze_acquisition(&input).is_none());
        input = AcquisitionInput::default();
        input.asking_price = Decimal::ZERO;
        assert!(analyze_acquisition(&input).is_none());
    }
}
