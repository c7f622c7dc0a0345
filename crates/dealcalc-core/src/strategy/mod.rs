//! Deal analysis for the three residential investment strategies.
//!
//! Every strategy shares one income statement and financing core
//! ([`deal::analyze_deal`]); the overlays in [`buy_hold`], [`fix_flip`] and
//! [`brrrr`] add the strategy-specific cash needs and returns.

pub mod brrrr;
pub mod buy_hold;
pub mod deal;
pub mod fix_flip;
pub mod form;

pub use brrrr::BrrrrResult;
pub use buy_hold::BuyHoldResult;
pub use deal::{
    analyze_deal, DealAnalysis, DealInput, DownPayment, FinancingStructure, FinancingSummary,
    FlipAssumptions, HoldAssumptions, RefinanceTerms, Strategy, StrategyResult,
};
pub use fix_flip::FixFlipResult;
pub use form::DealForm;
