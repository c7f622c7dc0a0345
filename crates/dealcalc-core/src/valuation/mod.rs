//! Small-business valuation: market multiples, DCF on SDE, and asset-based.

pub mod business;
pub mod multiples;
pub mod sector;

pub use business::{
    discounted_sde, value_business, DcfBreakdown, ValuationInput, ValuationOutput, ValuationRange,
};
pub use multiples::{
    AdjustmentDetail, BusinessAge, ContractQuality, EquipmentCondition, Industry,
    IndustryMultiples, LocationMarket, OwnerDependency, QualitativeFactors, RevenueType,
};
pub use sector::{PointMultiples, Sector};
