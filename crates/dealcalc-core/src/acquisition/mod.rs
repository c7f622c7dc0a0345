//! Business acquisition: bank loan plus seller note, cash returns, growth
//! projections, a valuation cross-check against the asking price, and
//! what-if scenarios.

pub mod analysis;
pub mod scenarios;

pub use analysis::{
    analyze_acquisition, AcquisitionAnalysis, AcquisitionInput, Assessment, BreakEven, DebtService,
    ImpliedMultiples, ProjectionYear, RoiMetrics, ValuationCheck, PROJECTION_YEARS,
};
pub use scenarios::{Scenario, ScenarioKind};
