use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{clamp_with_warning, pct, safe_div, safe_pct, Money, Percent};

/// DSCR at or below this is treated as unbankable.
pub const DSCR_HIGH_RISK_MAX: Decimal = dec!(1.15);
/// Minimum DSCR most lenders size to.
pub const DSCR_BANKABLE_MIN: Decimal = dec!(1.25);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Annual income lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealIncome {
    /// Scheduled rent (or base rent plus recoveries) at full occupancy
    pub gross_scheduled_income: Money,
    /// Parking, laundry, storage, etc.
    #[serde(default)]
    pub other_income: Money,
    /// Vacancy and credit loss as a percentage of gross potential income
    #[serde(default)]
    pub vacancy_rate_pct: Percent,
}

/// Annual operating expense lines. `management_pct` and `reserves_pct` are
/// charged on effective gross income; everything else is dollars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealExpenses {
    pub property_taxes: Money,
    pub insurance: Money,
    pub maintenance: Money,
    pub management_pct: Percent,
    pub utilities: Money,
    pub hoa: Money,
    pub reserves_pct: Percent,
    pub other: Money,
    /// Expenses reimbursed by a triple-net tenant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_throughs: Option<TenantPassThroughs>,
}

/// Taxes and insurance paid by the tenant under a triple-net lease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantPassThroughs {
    pub taxes: Money,
    pub insurance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub gross_potential_income: Money,
    pub vacancy_loss: Money,
    pub effective_gross_income: Money,
    /// Property taxes net of tenant reimbursement
    pub landlord_taxes: Money,
    /// Insurance net of tenant reimbursement
    pub landlord_insurance: Money,
    pub management_expense: Money,
    pub reserves_expense: Money,
    pub total_operating_expenses: Money,
    pub net_operating_income: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DscrBand {
    /// DSCR <= 1.15
    HighRisk,
    /// 1.15 < DSCR < 1.25
    Marginal,
    /// DSCR >= 1.25
    Bankable,
}

/// Deal-level figures the ratios are measured against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioBasis {
    pub purchase_price: Money,
    pub loan_amount: Money,
    pub annual_debt_service: Money,
    pub total_cash_invested: Money,
    /// Scheduled rent only, for the gross rent multiplier
    pub annual_gross_rent: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealRatios {
    pub cap_rate: Percent,
    pub expense_ratio: Percent,
    pub dscr: Decimal,
    /// `None` when the deal carries no debt service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr_band: Option<DscrBand>,
    pub debt_yield: Percent,
    pub cash_on_cash: Percent,
    pub gross_rent_multiplier: Decimal,
    pub break_even_ratio: Percent,
    /// NOI less annual debt service
    pub annual_cash_flow: Money,
    pub monthly_cash_flow: Money,
}

// ---------------------------------------------------------------------------
// Sanitising
// ---------------------------------------------------------------------------

impl DealIncome {
    /// Copy with vacancy clamped to [0, 100].
    pub fn sanitized(&self, warnings: &mut Vec<String>) -> DealIncome {
        DealIncome {
            vacancy_rate_pct: clamp_with_warning(
                "vacancy_rate_pct",
                self.vacancy_rate_pct,
                Decimal::ZERO,
                dec!(100),
                warnings,
            ),
            ..self.clone()
        }
    }

    /// Both income lines scaled by `factor` (rent growth).
    pub fn grown(&self, factor: Decimal) -> DealIncome {
        DealIncome {
            gross_scheduled_income: self.gross_scheduled_income * factor,
            other_income: self.other_income * factor,
            vacancy_rate_pct: self.vacancy_rate_pct,
        }
    }

    pub fn gross_potential_income(&self) -> Money {
        self.gross_scheduled_income + self.other_income
    }
}

impl DealExpenses {
    /// Copy with negative dollar lines floored at 0 and percentages clamped to [0, 100].
    pub fn sanitized(&self, warnings: &mut Vec<String>) -> DealExpenses {
        let floor = |v: Money| v.max(Decimal::ZERO);
        DealExpenses {
            property_taxes: floor(self.property_taxes),
            insurance: floor(self.insurance),
            maintenance: floor(self.maintenance),
            management_pct: clamp_with_warning(
                "management_pct",
                self.management_pct,
                Decimal::ZERO,
                dec!(100),
                warnings,
            ),
            utilities: floor(self.utilities),
            hoa: floor(self.hoa),
            reserves_pct: clamp_with_warning(
                "reserves_pct",
                self.reserves_pct,
                Decimal::ZERO,
                dec!(100),
                warnings,
            ),
            other: floor(self.other),
            pass_throughs: self.pass_throughs.as_ref().map(|p| TenantPassThroughs {
                taxes: floor(p.taxes),
                insurance: floor(p.insurance),
            }),
        }
    }
}

impl DscrBand {
    pub fn classify(dscr: Decimal) -> DscrBand {
        if dscr <= DSCR_HIGH_RISK_MAX {
            DscrBand::HighRisk
        } else if dscr < DSCR_BANKABLE_MIN {
            DscrBand::Marginal
        } else {
            DscrBand::Bankable
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Gross potential income through to NOI.
///
/// Order matters: vacancy comes off gross potential income, then management
/// and reserves are charged on what is left (EGI). Tenant pass-throughs
/// reduce taxes and insurance independently, each floored at 0.
pub fn build_income_statement(income: &DealIncome, expenses: &DealExpenses) -> IncomeStatement {
    let vacancy = income.vacancy_rate_pct.max(Decimal::ZERO).min(dec!(100));

    let gross_potential_income = income.gross_potential_income();
    let vacancy_loss = gross_potential_income * pct(vacancy);
    let effective_gross_income = gross_potential_income - vacancy_loss;

    let management_expense = effective_gross_income * pct(expenses.management_pct);
    let reserves_expense = effective_gross_income * pct(expenses.reserves_pct);

    let (tenant_taxes, tenant_insurance) = expenses
        .pass_throughs
        .as_ref()
        .map(|p| (p.taxes, p.insurance))
        .unwrap_or_default();
    let landlord_taxes = (expenses.property_taxes - tenant_taxes).max(Decimal::ZERO);
    let landlord_insurance = (expenses.insurance - tenant_insurance).max(Decimal::ZERO);

    let total_operating_expenses = landlord_taxes
        + landlord_insurance
        + expenses.maintenance
        + expenses.utilities
        + expenses.hoa
        + expenses.other
        + management_expense
        + reserves_expense;

    IncomeStatement {
        gross_potential_income,
        vacancy_loss,
        effective_gross_income,
        landlord_taxes,
        landlord_insurance,
        management_expense,
        reserves_expense,
        total_operating_expenses,
        net_operating_income: effective_gross_income - total_operating_expenses,
    }
}

/// Standard underwriting ratios. Any ratio whose denominator is zero or
/// negative reads as 0.
pub fn compute_ratios(statement: &IncomeStatement, basis: &RatioBasis) -> DealRatios {
    let noi = statement.net_operating_income;
    let egi = statement.effective_gross_income;
    let ads = basis.annual_debt_service;
    let annual_cash_flow = noi - ads;
    let dscr = safe_div(noi, ads);

    DealRatios {
        cap_rate: safe_pct(noi, basis.purchase_price),
        expense_ratio: safe_pct(statement.total_operating_expenses, egi),
        dscr,
        dscr_band: (ads > Decimal::ZERO).then(|| DscrBand::classify(dscr)),
        debt_yield: safe_pct(noi, basis.loan_amount),
        cash_on_cash: safe_pct(annual_cash_flow, basis.total_cash_invested),
        gross_rent_multiplier: safe_div(basis.purchase_price, basis.annual_gross_rent),
        break_even_ratio: safe_pct(statement.total_operating_expenses + ads, egi),
        annual_cash_flow,
        monthly_cash_flow: annual_cash_flow / dec!(12),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Single-family rental: $2,200/mo rent, $100/mo other income
    fn sample_income() -> DealIncome {
        DealIncome {
            gross_scheduled_income: dec!(26400),
            other_income: dec!(1200),
            vacancy_rate_pct: dec!(5),
        }
    }

    fn sample_expenses() -> DealExpenses {
        DealExpenses {
            property_taxes: dec!(3000),
            insurance: dec!(1200),
            maintenance: dec!(1500),
            management_pct: dec!(8),
            other: dec!(500),
            ..DealExpenses::default()
        }
    }

    #[test]
    fn test_statement_order_of_operations() {
        let s = build_income_statement(&sample_income(), &sample_expenses());

        // GPI = 26,400 + 1,200 = 27,600; vacancy 5% = 1,380; EGI = 26,220
        assert_eq!(s.gross_potential_income, dec!(27600));
        assert_eq!(s.vacancy_loss, dec!(1380));
        assert_eq!(s.effective_gross_income, dec!(26220));
        // Management on EGI, not GPI: 26,220 * 8% = 2,097.60
        assert_eq!(s.management_expense, dec!(2097.60));
        // 3,000 + 1,200 + 1,500 + 500 + 2,097.60 = 8,297.60
        assert_eq!(s.total_operating_expenses, dec!(8297.60));
        assert_eq!(s.net_operating_income, dec!(17922.40));
    }

    #[test]
    fn test_reserves_on_egi() {
        let expenses = DealExpenses {
            reserves_pct: dec!(2),
            ..DealExpenses::default()
        };
        let s = build_income_statement(&sample_income(), &expenses);
        // 26,220 * 2% = 524.40
        assert_eq!(s.reserves_expense, dec!(524.40));
    }

    #[test]
    fn test_vacancy_clamped() {
        let mut income = sample_income();
        income.vacancy_rate_pct = dec!(140);
        let s = build_income_statement(&income, &DealExpenses::default());
        assert_eq!(s.effective_gross_income, Decimal::ZERO);

        income.vacancy_rate_pct = dec!(-10);
        let s = build_income_statement(&income, &DealExpenses::default());
        assert_eq!(s.vacancy_loss, Decimal::ZERO);

        let mut warnings = Vec::new();
        income.vacancy_rate_pct = dec!(140);
        assert_eq!(income.sanitized(&mut warnings).vacancy_rate_pct, dec!(100));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_pass_throughs_floor_per_component() {
        let expenses = DealExpenses {
            property_taxes: dec!(20000),
            insurance: dec!(8000),
            pass_throughs: Some(TenantPassThroughs {
                taxes: dec!(25000),
                insurance: dec!(3000),
            }),
            ..DealExpenses::default()
        };
        let s = build_income_statement(&sample_income(), &expenses);
        // Excess tax reimbursement does not offset insurance
        assert_eq!(s.landlord_taxes, Decimal::ZERO);
        assert_eq!(s.landlord_insurance, dec!(5000));
        assert_eq!(s.total_operating_expenses, dec!(5000));
    }

    #[test]
    fn test_ratios() {
        let s = build_income_statement(&sample_income(), &sample_expenses());
        let basis = RatioBasis {
            purchase_price: dec!(250000),
            loan_amount: dec!(187500),
            annual_debt_service: dec!(15000),
            total_cash_invested: dec!(67500),
            annual_gross_rent: dec!(26400),
        };
        let r = compute_ratios(&s, &basis);

        // 17,922.40 / 250,000 = 7.16896%
        assert_eq!(r.cap_rate, dec!(7.16896));
        // 17,922.40 / 15,000 = 1.19482...
        assert_eq!(r.dscr_band, Some(DscrBand::Marginal));
        assert_eq!(r.annual_cash_flow, dec!(2922.40));
        // 2,922.40 / 67,500 = 4.3295%
        assert!((r.cash_on_cash - dec!(4.3295)).abs() < dec!(0.0001));
        // 250,000 / 26,400 = 9.4697
        assert!((r.gross_rent_multiplier - dec!(9.4697)).abs() < dec!(0.0001));
        // (8,297.60 + 15,000) / 26,220 = 88.854%
        assert!((r.break_even_ratio - dec!(88.854)).abs() < dec!(0.001));
    }

    #[test]
    fn test_ratios_guard_zero_denominators() {
        let s = build_income_statement(&DealIncome::default(), &DealExpenses::default());
        let r = compute_ratios(&s, &RatioBasis::default());
        assert_eq!(r.cap_rate, Decimal::ZERO);
        assert_eq!(r.expense_ratio, Decimal::ZERO);
        assert_eq!(r.dscr, Decimal::ZERO);
        assert_eq!(r.dscr_band, None);
        assert_eq!(r.debt_yield, Decimal::ZERO);
        assert_eq!(r.cash_on_cash, Decimal::ZERO);
        assert_eq!(r.gross_rent_multiplier, Decimal::ZERO);
        assert_eq!(r.break_even_ratio, Decimal::ZERO);
    }

    #[test]
    fn test_dscr_band_thresholds() {
        assert_eq!(DscrBand::classify(dec!(1.15)), DscrBand::HighRisk);
        assert_eq!(DscrBand::classify(dec!(1.16)), DscrBand::Marginal);
        assert_eq!(DscrBand::classify(dec!(1.25)), DscrBand::Bankable);
        assert_eq!(DscrBand::classify(Decimal::ZERO), DscrBand::HighRisk);
    }
}
