use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::DealCalcError;
use crate::financing::amortization::MAX_TERM_YEARS;
use crate::financing::LoanTerms;
use crate::income::{
    build_income_statement, compute_ratios, DealExpenses, DealIncome, DealRatios, IncomeStatement,
    RatioBasis, TenantPassThroughs,
};
use crate::projection::{build_equity_schedule, sale_proceeds, EquityScheduleInput, EquityScheduleRow};
use crate::types::{
    clamp_with_warning, pct, safe_div, with_metadata, ComputationOutput, Money, Percent, ValueRange,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Office,
    #[default]
    Retail,
    Industrial,
    MixedUse,
    Multifamily,
    SelfStorage,
    /// Single-tenant triple-net lease
    Nnn,
    MedicalOffice,
    Warehouse,
}

/// A multi-tenant or single-tenant commercial building priced by the square foot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommercialPropertyInput {
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    pub purchase_price: Money,
    pub square_footage: Decimal,
    /// Annual base rent per square foot
    pub base_rent_per_sqft: Money,
    /// Annual common-area maintenance recoveries per square foot
    pub cam_per_sqft: Money,
    pub other_income: Money,
    pub vacancy_rate_pct: Percent,
    /// Annual taxes and insurance reimbursed by the tenant(s)
    pub tenant_pays_taxes: Money,
    pub tenant_pays_insurance: Money,
    pub property_taxes: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub management_pct: Percent,
    pub utilities: Money,
    pub reserves_pct: Percent,
    pub down_payment_pct: Percent,
    pub rate_pct: Percent,
    pub amortization_years: u32,
    pub appreciation_rate_pct: Percent,
    pub hold_period_years: u32,
    pub selling_costs_pct: Percent,
    pub lease_term_years: u32,
    /// Annual base-rent escalation
    pub rent_escalation_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommercialFinancing {
    pub down_payment: Money,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBenchmarks {
    /// Typical vacancy for the property type, percent
    pub vacancy_pct: ValueRange,
    /// Typical going-in cap rate for the property type, percent
    pub cap_rate_pct: ValueRange,
    /// NOI capitalised at the benchmark cap rates (high cap gives the low value)
    pub implied_value: ValueRange,
    pub cap_rate_within_range: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommercialPropertyOutput {
    pub annual_base_rent: Money,
    pub annual_cam_recoveries: Money,
    pub income_statement: IncomeStatement,
    pub ratios: DealRatios,
    pub financing: CommercialFinancing,
    pub price_per_sqft: Money,
    pub noi_per_sqft: Money,
    /// Down payment only; closing costs are not modelled here
    pub total_cash_invested: Money,
    pub equity_schedule: Vec<EquityScheduleRow>,
    pub sale_proceeds: Money,
    pub rent_in_5_years: Money,
    pub rent_in_10_years: Money,
    /// Base rent for each year of the lease, escalated annually
    pub lease_rent_schedule: Vec<Money>,
    pub benchmarks: MarketBenchmarks,
}

impl Default for CommercialPropertyInput {
    fn default() -> Self {
        CommercialPropertyInput {
            property_type: PropertyType::Retail,
            tenant_name: None,
            purchase_price: dec!(2000000),
            square_footage: dec!(10000),
            base_rent_per_sqft: dec!(25),
            cam_per_sqft: dec!(5),
            other_income: Decimal::ZERO,
            vacancy_rate_pct: dec!(5),
            tenant_pays_taxes: Decimal::ZERO,
            tenant_pays_insurance: Decimal::ZERO,
            property_taxes: dec!(20000),
            insurance: dec!(8000),
            maintenance: dec!(15000),
            management_pct: dec!(4),
            utilities: Decimal::ZERO,
            reserves_pct: dec!(1),
            down_payment_pct: dec!(30),
            rate_pct: dec!(7.25),
            amortization_years: 25,
            appreciation_rate_pct: dec!(3),
            hold_period_years: 10,
            selling_costs_pct: dec!(4),
            lease_term_years: 10,
            rent_escalation_pct: dec!(2),
        }
    }
}

impl PropertyType {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Office => "Office",
            PropertyType::Retail => "Retail",
            PropertyType::Industrial => "Industrial",
            PropertyType::MixedUse => "Mixed-Use",
            PropertyType::Multifamily => "Multifamily (5+)",
            PropertyType::SelfStorage => "Self-Storage",
            PropertyType::Nnn => "NNN Lease",
            PropertyType::MedicalOffice => "Medical Office",
            PropertyType::Warehouse => "Warehouse",
        }
    }

    /// Typical (low, high) vacancy, percent.
    pub fn vacancy_benchmark(&self) -> (Percent, Percent) {
        match self {
            PropertyType::Office => (dec!(10), dec!(15)),
            PropertyType::Retail | PropertyType::MixedUse | PropertyType::MedicalOffice => {
                (dec!(5), dec!(8))
            }
            PropertyType::Industrial | PropertyType::Multifamily | PropertyType::Warehouse => {
                (dec!(3), dec!(5))
            }
            PropertyType::SelfStorage => (dec!(8), dec!(12)),
            PropertyType::Nnn => (dec!(2), dec!(4)),
        }
    }

    /// Typical (low, high) going-in cap rate, percent.
    pub fn cap_rate_benchmark(&self) -> (Percent, Percent) {
        match self {
            PropertyType::Office => (dec!(6.5), dec!(8.5)),
            PropertyType::Retail | PropertyType::MixedUse | PropertyType::SelfStorage => {
                (dec!(5.5), dec!(7.5))
            }
            PropertyType::Industrial | PropertyType::Multifamily | PropertyType::Nnn => {
                (dec!(4.5), dec!(6.5))
            }
            PropertyType::MedicalOffice => (dec!(5.5), dec!(7.0)),
            PropertyType::Warehouse => (dec!(4.5), dec!(6.0)),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = DealCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "office" => Ok(PropertyType::Office),
            "retail" => Ok(PropertyType::Retail),
            "industrial" => Ok(PropertyType::Industrial),
            "mixeduse" => Ok(PropertyType::MixedUse),
            "multifamily" => Ok(PropertyType::Multifamily),
            "selfstorage" => Ok(PropertyType::SelfStorage),
            "nnn" | "nnnlease" | "triplenet" => Ok(PropertyType::Nnn),
            "medicaloffice" => Ok(PropertyType::MedicalOffice),
            "warehouse" => Ok(PropertyType::Warehouse),
            _ => Err(DealCalcError::InvalidInput {
                field: "property_type".into(),
                reason: format!("unknown property type '{s}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Per-square-foot income approach for a commercial building, with leverage,
/// a hold-period equity schedule and a market benchmark check.
///
/// Returns `None` until price and square footage are entered.
pub fn analyze_commercial_property(
    input: &CommercialPropertyInput,
) -> Option<ComputationOutput<CommercialPropertyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.purchase_price <= Decimal::ZERO || input.square_footage <= Decimal::ZERO {
        return None;
    }

    let price = input.purchase_price;
    let sqft = input.square_footage;

    let annual_base_rent = (input.base_rent_per_sqft * sqft).max(Decimal::ZERO);
    let annual_cam_recoveries = (input.cam_per_sqft * sqft).max(Decimal::ZERO);

    let income = DealIncome {
        gross_scheduled_income: annual_base_rent + annual_cam_recoveries,
        other_income: input.other_income,
        vacancy_rate_pct: input.vacancy_rate_pct,
    }
    .sanitized(&mut warnings);
    let pass_throughs = (input.tenant_pays_taxes > Decimal::ZERO
        || input.tenant_pays_insurance > Decimal::ZERO)
        .then(|| TenantPassThroughs {
            taxes: input.tenant_pays_taxes,
            insurance: input.tenant_pays_insurance,
        });
    let expenses = DealExpenses {
        property_taxes: input.property_taxes,
        insurance: input.insurance,
        maintenance: input.maintenance,
        management_pct: input.management_pct,
        utilities: input.utilities,
        reserves_pct: input.reserves_pct,
        pass_throughs,
        ..DealExpenses::default()
    }
    .sanitized(&mut warnings);
    let statement = build_income_statement(&income, &expenses);
    let noi = statement.net_operating_income;

    let down_pct = clamp_with_warning(
        "down_payment_pct",
        input.down_payment_pct,
        Decimal::ZERO,
        dec!(100),
        &mut warnings,
    );
    let down_payment = price * pct(down_pct);
    let loan = LoanTerms::new(price - down_payment, input.rate_pct, input.amortization_years)
        .sanitized("mortgage", &mut warnings);
    let monthly_payment = loan.monthly_payment();
    let annual_debt_service = loan.annual_debt_service();

    let ratios = compute_ratios(
        &statement,
        &RatioBasis {
            purchase_price: price,
            loan_amount: loan.principal,
            annual_debt_service,
            total_cash_invested: down_payment,
            annual_gross_rent: annual_base_rent,
        },
    );

    let appreciation = clamp_with_warning(
        "appreciation_rate_pct",
        input.appreciation_rate_pct,
        dec!(-100),
        dec!(100),
        &mut warnings,
    );
    let schedule = build_equity_schedule(&EquityScheduleInput {
        initial_value: price,
        growth_rate_pct: appreciation,
        hold_period_years: input.hold_period_years,
        loans: vec![loan],
    });
    let selling = clamp_with_warning(
        "selling_costs_pct",
        input.selling_costs_pct,
        Decimal::ZERO,
        dec!(100),
        &mut warnings,
    );
    let proceeds = sale_proceeds(&schedule.exit, selling);

    let escalation = clamp_with_warning(
        "rent_escalation_pct",
        input.rent_escalation_pct,
        dec!(-100),
        dec!(100),
        &mut warnings,
    );
    let lease_years = input.lease_term_years.min(MAX_TERM_YEARS);
    let lease_rent_schedule: Vec<Money> = (0..lease_years)
        .map(|year| escalated(annual_base_rent, escalation, year))
        .collect();

    let benchmarks = benchmark(input.property_type, noi, ratios.cap_rate);
    push_market_warnings(input, &statement, &ratios, &benchmarks, &mut warnings);

    let output = CommercialPropertyOutput {
        annual_base_rent,
        annual_cam_recoveries,
        price_per_sqft: price / sqft,
        noi_per_sqft: noi / sqft,
        total_cash_invested: down_payment,
        financing: CommercialFinancing {
            down_payment,
            loan_amount: loan.principal,
            monthly_payment,
            annual_debt_service,
        },
        equity_schedule: schedule.rows,
        sale_proceeds: proceeds,
        rent_in_5_years: escalated(annual_base_rent, escalation, 5),
        rent_in_10_years: escalated(annual_base_rent, escalation, 10),
        lease_rent_schedule,
        benchmarks,
        income_statement: statement,
        ratios,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        &format!("{} property analysis (per-square-foot income approach)", input.property_type),
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn escalated(rent: Money, escalation_pct: Percent, years: u32) -> Money {
    (Decimal::ONE + pct(escalation_pct))
        .checked_powi(i64::from(years))
        .map(|factor| rent * factor)
        .unwrap_or(rent)
}

fn benchmark(property_type: PropertyType, noi: Money, cap_rate: Percent) -> MarketBenchmarks {
    let (vac_low, vac_high) = property_type.vacancy_benchmark();
    let (cap_low, cap_high) = property_type.cap_rate_benchmark();
    let cap_mid = (cap_low + cap_high) / dec!(2);

    MarketBenchmarks {
        vacancy_pct: ValueRange::new(vac_low, (vac_low + vac_high) / dec!(2), vac_high),
        cap_rate_pct: ValueRange::new(cap_low, cap_mid, cap_high),
        implied_value: ValueRange::new(
            safe_div(noi, pct(cap_high)),
            safe_div(noi, pct(cap_mid)),
            safe_div(noi, pct(cap_low)),
        ),
        cap_rate_within_range: cap_rate >= cap_low && cap_rate <= cap_high,
    }
}

fn push_market_warnings(
    input: &CommercialPropertyInput,
    statement: &IncomeStatement,
    ratios: &DealRatios,
    benchmarks: &MarketBenchmarks,
    warnings: &mut Vec<String>,
) {
    if !benchmarks.cap_rate_within_range {
        warnings.push(format!(
            "Cap rate of {:.2}% is outside the {:.1}-{:.1}% typical for {}",
            ratios.cap_rate,
            benchmarks.cap_rate_pct.low,
            benchmarks.cap_rate_pct.high,
            input.property_type
        ));
    }
    if input.vacancy_rate_pct < benchmarks.vacancy_pct.low {
        warnings.push(format!(
            "Vacancy of {}% is below the {}-{}% typical for {}",
            input.vacancy_rate_pct,
            benchmarks.vacancy_pct.low,
            benchmarks.vacancy_pct.high,
            input.property_type
        ));
    }
    if statement.net_operating_income <= Decimal::ZERO {
        warnings.push("Operating expenses exceed effective gross income".into());
    }
    if ratios.dscr_band.is_some() && ratios.dscr < dec!(1.25) {
        warnings.push(format!("DSCR of {:.2} is below the 1.25x lenders require", ratios.dscr));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_building() {
        let out = analyze_commercial_property(&CommercialPropertyInput::default()).unwrap();
        let r = &out.result;
        assert_eq!(r.annual_base_rent, dec!(250000));
        assert_eq!(r.annual_cam_recoveries, dec!(50000));
        assert_eq!(r.income_statement.effective_gross_income, dec!(285000));
        // 20,000 + 8,000 + 15,000 + 11,400 mgmt + 2,850 reserves
        assert_eq!(r.income_statement.total_operating_expenses, dec!(57250));
        assert_eq!(r.income_statement.net_operating_income, dec!(227750));
        assert_eq!(r.price_per_sqft, dec!(200));
        assert_eq!(r.noi_per_sqft, dec!(22.775));
        assert_eq!(r.ratios.cap_rate, dec!(11.3875));
    }

    #[test]
    fn test_financing_and_schedule() {
        let r = analyze_commercial_property(&CommercialPropertyInput::default())
            .unwrap()
            .result;
        assert_eq!(r.financing.down_payment, dec!(600000));
        assert_eq!(r.financing.loan_amount, dec!(1400000));
        assert_eq!(r.equity_schedule.len(), 11);
        assert_eq!(r.equity_schedule[0].equity, dec!(600000));
        assert!((r.ratios.debt_yield - dec!(16.2679)).abs() < dec!(0.0001));
        // Cash-on-cash is on the down payment alone
        assert_eq!(
            r.ratios.cash_on_cash,
            r.ratios.annual_cash_flow / dec!(600000) * dec!(100)
        );
        let exit = r.equity_schedule.last().unwrap();
        let expected = exit.asset_value - exit.total_debt_balance - exit.asset_value * dec!(0.04);
        assert_eq!(r.sale_proceeds, expected);
    }

    #[test]
    fn test_rent_escalation() {
        let r = analyze_commercial_property(&CommercialPropertyInput::default())
            .unwrap()
            .result;
        // 250,000 * 1.02^5
        assert_eq!(r.rent_in_5_years, dec!(276020.2008));
        assert!((r.rent_in_10_years - dec!(304748.605)).abs() < dec!(0.001));
        assert_eq!(r.lease_rent_schedule.len(), 10);
        assert_eq!(r.lease_rent_schedule[0], dec!(250000));
        assert_eq!(r.lease_rent_schedule[1], dec!(255000));
    }

    #[test]
    fn test_pass_throughs_floor_per_component() {
        let input = CommercialPropertyInput {
            property_type: PropertyType::Nnn,
            tenant_pays_taxes: dec!(25000),
            tenant_pays_insurance: dec!(3000),
            ..CommercialPropertyInput::default()
        };
        let r = analyze_commercial_property(&input).unwrap().result;
        // Tax reimbursement exceeds taxes: floored at 0, not netted against insurance
        assert_eq!(r.income_statement.landlord_taxes, Decimal::ZERO);
        assert_eq!(r.income_statement.landlord_insurance, dec!(5000));
        assert_eq!(r.income_statement.total_operating_expenses, dec!(34250));
    }

    #[test]
    fn test_benchmark_warning() {
        let out = analyze_commercial_property(&CommercialPropertyInput::default()).unwrap();
        let b = &out.result.benchmarks;
        assert!(!b.cap_rate_within_range);
        assert!(out.warnings.iter().any(|w| w.contains("typical for Retail")));
        // 227,750 capitalised at 7.5% / 6.5% / 5.5%
        assert!((b.implied_value.low - dec!(3036666.67)).abs() < dec!(0.01));
        assert!((b.implied_value.mid - dec!(3503846.15)).abs() < dec!(0.01));
        assert!((b.implied_value.high - dec!(4140909.09)).abs() < dec!(0.01));
    }

    #[test]
    fn test_property_type_parsing() {
        assert_eq!("Mixed-Use".parse::<PropertyType>().unwrap(), PropertyType::MixedUse);
        assert_eq!("NNN Lease".parse::<PropertyType>().unwrap(), PropertyType::Nnn);
        assert_eq!("Multifamily (5+)".parse::<PropertyType>().unwrap(), PropertyType::Multifamily);
        assert!("castle".parse::<PropertyType>().is_err());
    }

    #[test]
    fn test_requires_price_and_area() {
        let mut input = CommercialPropertyInput::default();
        input.square_footage = Decimal::ZERO;
        assert!(analyze_commercial_property(&input).is_none());
        input = CommercialPropertyInput::default();
        input.purchase_price = dec!(-1);
        assert!(analyze_commercial_property(&input).is_none());
    }
}
