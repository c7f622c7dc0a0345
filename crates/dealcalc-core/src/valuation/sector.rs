//! Point multiples used to sanity-check an acquisition's asking price.
//!
//! Coarser than the broker bands in [`super::multiples`]: one number per
//! metric, keyed by a short list of sectors with `Other` as the fallback.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::multiples::Industry;
use crate::types::Multiple;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sector {
    Restaurant,
    Retail,
    Manufacturing,
    Services,
    Healthcare,
    Technology,
    RealEstate,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointMultiples {
    pub sde: Multiple,
    pub ebitda: Multiple,
    pub revenue: Multiple,
}

impl Sector {
    pub const ALL: [Sector; 8] = [
        Sector::Restaurant,
        Sector::Retail,
        Sector::Manufacturing,
        Sector::Services,
        Sector::Healthcare,
        Sector::Technology,
        Sector::RealEstate,
        Sector::Other,
    ];

    /// Lowercases and drops whitespace before matching; anything unknown is `Other`.
    pub fn from_key(key: &str) -> Sector {
        let key: String = key
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "restaurant" => Sector::Restaurant,
            "retail" => Sector::Retail,
            "manufacturing" => Sector::Manufacturing,
            "services" => Sector::Services,
            "healthcare" => Sector::Healthcare,
            "technology" => Sector::Technology,
            "realestate" => Sector::RealEstate,
            _ => Sector::Other,
        }
    }

    pub fn multiples(&self) -> PointMultiples {
        let (sde, ebitda, revenue) = match self {
            Sector::Restaurant => (dec!(2.5), dec!(4.0), dec!(0.5)),
            Sector::Retail => (dec!(2.0), dec!(3.5), dec!(0.4)),
            Sector::Manufacturing => (dec!(3.5), dec!(5.5), dec!(0.7)),
            Sector::Services => (dec!(3.0), dec!(5.0), dec!(0.8)),
            Sector::Healthcare => (dec!(4.0), dec!(6.0), dec!(0.6)),
            Sector::Technology => (dec!(4.5), dec!(7.0), dec!(1.5)),
            Sector::RealEstate => (dec!(3.0), dec!(5.0), dec!(0.5)),
            Sector::Other => (dec!(2.5), dec!(4.0), dec!(0.5)),
        };
        PointMultiples { sde, ebitda, revenue }
    }
}

impl From<Industry> for Sector {
    fn from(industry: Industry) -> Self {
        match industry {
            Industry::Restaurant => Sector::Restaurant,
            Industry::Retail => Sector::Retail,
            Industry::Manufacturing => Sector::Manufacturing,
            Industry::Services => Sector::Services,
            Industry::Healthcare => Sector::Healthcare,
            Industry::Technology => Sector::Technology,
            Industry::Construction
            | Industry::LawnCare
            | Industry::Janitorial
            | Industry::AutoRepair
            | Industry::Logistics
            | Industry::HomeServices => Sector::Other,
        }
    }
}
