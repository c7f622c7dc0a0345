//! Market multiple tables and the qualitative factors that shift them.
//!
//! The SDE and EBITDA bands are the rule-of-thumb ranges brokers quote for
//! owner-operated businesses under roughly $5M of revenue.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DealCalcError;
use crate::types::{Multiple, ValueRange};

// ---------------------------------------------------------------------------
// Industries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Restaurant,
    Retail,
    Manufacturing,
    #[default]
    Services,
    Healthcare,
    Technology,
    Construction,
    LawnCare,
    Janitorial,
    AutoRepair,
    Logistics,
    HomeServices,
}

/// Low / mid / high multiples for one industry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryMultiples {
    pub sde: ValueRange,
    pub ebitda: ValueRange,
}

impl Industry {
    pub const ALL: [Industry; 12] = [
        Industry::Restaurant,
        Industry::Retail,
        Industry::Manufacturing,
        Industry::Services,
        Industry::Healthcare,
        Industry::Technology,
        Industry::Construction,
        Industry::LawnCare,
        Industry::Janitorial,
        Industry::AutoRepair,
        Industry::Logistics,
        Industry::HomeServices,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Industry::Restaurant => "Restaurant / Food Service",
            Industry::Retail => "Retail",
            Industry::Manufacturing => "Manufacturing",
            Industry::Services => "Professional Services",
            Industry::Healthcare => "Healthcare",
            Industry::Technology => "Technology / SaaS",
            Industry::Construction => "Construction / Trades",
            Industry::LawnCare => "Lawn Care / Landscaping",
            Industry::Janitorial => "Janitorial / Cleaning",
            Industry::AutoRepair => "Auto Repair / Services",
            Industry::Logistics => "Logistics / Transportation",
            Industry::HomeServices => "Home Services",
        }
    }

    pub fn multiples(&self) -> IndustryMultiples {
        let (sde, ebitda) = match self {
            Industry::Restaurant => (
                ValueRange::new(dec!(1.5), dec!(2.5), dec!(3.5)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.0)),
            ),
            Industry::Retail => (
                ValueRange::new(dec!(1.5), dec!(2.0), dec!(3.0)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.0)),
            ),
            Industry::Manufacturing => (
                ValueRange::new(dec!(2.5), dec!(3.5), dec!(5.0)),
                ValueRange::new(dec!(4.0), dec!(5.0), dec!(7.0)),
            ),
            Industry::Services => (
                ValueRange::new(dec!(2.0), dec!(3.0), dec!(4.0)),
                ValueRange::new(dec!(3.5), dec!(4.5), dec!(6.0)),
            ),
            Industry::Healthcare => (
                ValueRange::new(dec!(2.5), dec!(4.0), dec!(6.0)),
                ValueRange::new(dec!(5.0), dec!(7.0), dec!(10.0)),
            ),
            Industry::Technology => (
                ValueRange::new(dec!(3.0), dec!(4.5), dec!(7.0)),
                ValueRange::new(dec!(5.0), dec!(8.0), dec!(12.0)),
            ),
            Industry::Construction => (
                ValueRange::new(dec!(1.5), dec!(2.5), dec!(3.5)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.0)),
            ),
            Industry::LawnCare => (
                ValueRange::new(dec!(2.0), dec!(2.5), dec!(3.0)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.0)),
            ),
            Industry::Janitorial => (
                ValueRange::new(dec!(2.0), dec!(2.5), dec!(3.5)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.5)),
            ),
            Industry::AutoRepair => (
                ValueRange::new(dec!(1.5), dec!(2.5), dec!(3.5)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.0)),
            ),
            Industry::Logistics => (
                ValueRange::new(dec!(2.0), dec!(3.0), dec!(4.0)),
                ValueRange::new(dec!(3.5), dec!(4.5), dec!(6.0)),
            ),
            Industry::HomeServices => (
                ValueRange::new(dec!(2.0), dec!(2.5), dec!(3.5)),
                ValueRange::new(dec!(3.0), dec!(4.0), dec!(5.0)),
            ),
        };
        IndustryMultiples { sde, ebitda }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Industry {
    type Err = DealCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "restaurant" | "foodservice" => Ok(Industry::Restaurant),
            "retail" => Ok(Industry::Retail),
            "manufacturing" => Ok(Industry::Manufacturing),
            "services" | "professionalservices" => Ok(Industry::Services),
            "healthcare" => Ok(Industry::Healthcare),
            "technology" | "tech" | "saas" => Ok(Industry::Technology),
            "construction" | "trades" => Ok(Industry::Construction),
            "lawncare" | "landscaping" => Ok(Industry::LawnCare),
            "janitorial" | "cleaning" => Ok(Industry::Janitorial),
            "autorepair" => Ok(Industry::AutoRepair),
            "logistics" | "transportation" => Ok(Industry::Logistics),
            "homeservices" => Ok(Industry::HomeServices),
            _ => Err(DealCalcError::InvalidInput {
                field: "industry".into(),
                reason: format!("unknown industry '{s}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Qualitative factors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessAge {
    #[serde(rename = "under3")]
    UnderThree,
    #[default]
    #[serde(rename = "3to10")]
    ThreeToTen,
    #[serde(rename = "over10")]
    OverTen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevenueType {
    Project,
    #[default]
    Mixed,
    Recurring,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractQuality {
    MonthToMonth,
    #[default]
    Annual,
    MultiYear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OwnerDependency {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationMarket {
    Rural,
    #[default]
    Suburban,
    Urban,
}

/// Condition of the equipment counted in the asset-based value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentCondition {
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Business characteristics that move every multiple up or down together.
/// The defaults are all neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitativeFactors {
    pub business_age: BusinessAge,
    pub revenue_type: RevenueType,
    pub contract_quality: ContractQuality,
    pub owner_dependency: OwnerDependency,
    pub location_market: LocationMarket,
}

/// One factor's contribution to the multiple adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDetail {
    pub factor: String,
    pub adjustment: Decimal,
}

impl BusinessAge {
    pub fn adjustment(&self) -> Decimal {
        match self {
            BusinessAge::UnderThree => dec!(-0.15),
            BusinessAge::ThreeToTen => Decimal::ZERO,
            BusinessAge::OverTen => dec!(0.10),
        }
    }
}

impl RevenueType {
    pub fn adjustment(&self) -> Decimal {
        match self {
            RevenueType::Project => dec!(-0.10),
            RevenueType::Mixed => Decimal::ZERO,
            RevenueType::Recurring => dec!(0.15),
        }
    }
}

impl ContractQuality {
    pub fn adjustment(&self) -> Decimal {
        match self {
            ContractQuality::MonthToMonth => dec!(-0.10),
            ContractQuality::Annual => Decimal::ZERO,
            ContractQuality::MultiYear => dec!(0.10),
        }
    }
}

impl OwnerDependency {
    pub fn adjustment(&self) -> Decimal {
        match self {
            OwnerDependency::High => dec!(-0.15),
            OwnerDependency::Medium => Decimal::ZERO,
            OwnerDependency::Low => dec!(0.10),
        }
    }
}

impl LocationMarket {
    pub fn adjustment(&self) -> Decimal {
        match self {
            LocationMarket::Rural => dec!(-0.05),
            LocationMarket::Suburban => Decimal::ZERO,
            LocationMarket::Urban => dec!(0.05),
        }
    }
}

impl EquipmentCondition {
    /// Share of stated equipment value a buyer would credit.
    pub fn factor(&self) -> Decimal {
        match self {
            EquipmentCondition::Poor => dec!(0.40),
            EquipmentCondition::Fair => dec!(0.60),
            EquipmentCondition::Good => dec!(0.80),
            EquipmentCondition::Excellent => dec!(0.95),
        }
    }
}

impl QualitativeFactors {
    pub fn details(&self) -> Vec<AdjustmentDetail> {
        [
            ("Business Age", self.business_age.adjustment()),
            ("Revenue Type", self.revenue_type.adjustment()),
            ("Contract Quality", self.contract_quality.adjustment()),
            ("Owner Dependency", self.owner_dependency.adjustment()),
            ("Location/Market", self.location_market.adjustment()),
        ]
        .into_iter()
        .map(|(factor, adjustment)| AdjustmentDetail {
            factor: factor.to_string(),
            adjustment,
        })
        .collect()
    }

    /// Sum of the individual adjustments.
    pub fn total_adjustment(&self) -> Decimal {
        self.details().iter().map(|d| d.adjustment).sum()
    }

    /// `1 + total_adjustment`, applied to every multiple.
    pub fn multiplier(&self) -> Multiple {
        Decimal::ONE + self.total_adjustment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_values() {
        let tech = Industry::Technology.multiples();
        assert_eq!(tech.sde, ValueRange::new(dec!(3.0), dec!(4.5), dec!(7.0)));
        assert_eq!(tech.ebitda, ValueRange::new(dec!(5.0), dec!(8.0), dec!(12.0)));

        let services = Industry::Services.multiples();
        assert_eq!(services.sde, ValueRange::new(dec!(2), dec!(3), dec!(4)));

        let janitorial = Industry::Janitorial.multiples();
        assert_eq!(janitorial.ebitda.high, dec!(5.5));
    }

    #[test]
    fn test_bands_are_ordered() {
        for industry in Industry::ALL {
            let m = industry.multiples();
            for r in [m.sde, m.ebitda] {
                assert!(r.low <= r.mid && r.mid <= r.high, "{industry} band out of order");
            }
            assert!(m.ebitda.mid > m.sde.mid, "{industry}: EBITDA multiple should exceed SDE");
        }
    }

    #[test]
    fn test_neutral_factors() {
        let f = QualitativeFactors::default();
        assert_eq!(f.total_adjustment(), Decimal::ZERO);
        assert_eq!(f.multiplier(), Decimal::ONE);
    }

    #[test]
    fn test_factor_sum() {
        let f = QualitativeFactors {
            business_age: BusinessAge::OverTen,
            revenue_type: RevenueType::Recurring,
            contract_quality: ContractQuality::MultiYear,
            owner_dependency: OwnerDependency::High,
            location_market: LocationMarket::Rural,
        };
        // 0.10 + 0.15 + 0.10 - 0.15 - 0.05
        assert_eq!(f.total_adjustment(), dec!(0.15));
        assert_eq!(f.multiplier(), dec!(1.15));
        assert_eq!(f.details().len(), 5);
    }

    #[test]
    fn test_wire_keys() {
        let f: QualitativeFactors = serde_json::from_str(
            r#"{"business_age":"under3","contract_quality":"monthToMonth","owner_dependency":"low"}"#,
        )
        .unwrap();
        assert_eq!(f.business_age, BusinessAge::UnderThree);
        assert_eq!(f.contract_quality, ContractQuality::MonthToMonth);
        assert_eq!(f.owner_dependency, OwnerDependency::Low);
        assert_eq!(f.revenue_type, RevenueType::Mixed);

        let i: Industry = serde_json::from_str(r#""homeservices""#).unwrap();
        assert_eq!(i, Industry::HomeServices);
        assert_eq!("Technology / SaaS".parse::<Industry>().unwrap(), Industry::Technology);
        assert!("mining".parse::<Industry>().is_err());
    }
}
