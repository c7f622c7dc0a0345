use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent, Rate};

/// Initial guess used by every caller in the crate.
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

const NEWTON_TOLERANCE: Decimal = dec!(0.0001);
const MAX_NEWTON_ITERATIONS: u32 = 100;
const DERIVATIVE_FLOOR: Decimal = dec!(0.0001);
const BISECTION_TOLERANCE: Decimal = dec!(0.0000001);
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Solver domain: -99% to 1000% per period.
const RATE_FLOOR: Rate = dec!(-0.99);
const RATE_CEILING: Rate = dec!(10);

/// Lower bracket candidates, tightened when long series overflow near -99%.
const BRACKET_FLOORS: [Rate; 5] = [dec!(-0.99), dec!(-0.9), dec!(-0.75), dec!(-0.5), dec!(0)];

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

/// How an IRR estimate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrMethod {
    NewtonRaphson,
    Bisection,
    /// Neither method converged; the last in-range Newton iterate.
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Rate per period as a percentage (10 = 10%)
    pub rate_pct: Percent,
    pub converged: bool,
    pub method: IrrMethod,
    pub iterations: u32,
}

/// Internal rate of return as a percentage.
///
/// `cash_flows[0]` is the initial outlay; the last entry carries any exit
/// proceeds. This is an estimate: see [`solve_irr_detailed`] for whether the
/// solver converged.
pub fn solve_irr(cash_flows: &[Money], guess: Rate) -> Percent {
    solve_irr_detailed(cash_flows, guess).rate_pct
}

/// Newton-Raphson from `guess`, falling back to bisection over [-0.99, 10]
/// when Newton stalls on a flat derivative, leaves the domain, or runs out of
/// iterations.
pub fn solve_irr_detailed(cash_flows: &[Money], guess: Rate) -> IrrSolution {
    if cash_flows.len() < 2 {
        return IrrSolution {
            rate_pct: Decimal::ZERO,
            converged: false,
            method: IrrMethod::BestEffort,
            iterations: 0,
        };
    }

    let mut rate = guess.max(RATE_FLOOR).min(RATE_CEILING);
    let mut iterations = 0;

    while iterations < MAX_NEWTON_ITERATIONS {
        iterations += 1;

        let Some((f, df)) = npv_and_derivative(cash_flows, rate) else {
            log::debug!("IRR: NPV overflow at rate {rate}");
            break;
        };
        if df.abs() < DERIVATIVE_FLOOR {
            log::debug!("IRR: derivative {df} below floor at rate {rate}");
            break;
        }
        let Some(next) = f.checked_div(df).and_then(|step| rate.checked_sub(step)) else {
            break;
        };
        if next < RATE_FLOOR || next > RATE_CEILING {
            log::debug!("IRR: Newton iterate {next} left the solver domain");
            break;
        }

        let delta = (next - rate).abs();
        rate = next;
        if delta < NEWTON_TOLERANCE {
            return IrrSolution {
                rate_pct: rate * dec!(100),
                converged: true,
                method: IrrMethod::NewtonRaphson,
                iterations,
            };
        }
    }

    if let Some((root, steps)) = bisect(cash_flows) {
        log::debug!("IRR: bisection converged to {root} after {steps} steps");
        return IrrSolution {
            rate_pct: root * dec!(100),
            converged: true,
            method: IrrMethod::Bisection,
            iterations: iterations + steps,
        };
    }

    log::debug!("IRR: no bracket found, returning last in-range estimate {rate}");
    IrrSolution {
        rate_pct: rate * dec!(100),
        converged: false,
        method: IrrMethod::BestEffort,
        iterations,
    }
}

/// Net present value of `cash_flows` at `rate`, the first flow undiscounted.
///
/// `None` when `rate <= -1` or the discounting overflows.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    npv_and_derivative(cash_flows, rate).map(|(value, _)| value)
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as u64)
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}

fn bisect(cash_flows: &[Money]) -> Option<(Rate, u32)> {
    let mut high = RATE_CEILING;
    let f_high = npv(high, cash_flows)?;
    let (mut low, mut f_low) = BRACKET_FLOORS
        .iter()
        .find_map(|&floor| npv(floor, cash_flows).map(|f| (floor, f)))?;

    if f_low.is_zero() {
        return Some((low, 0));
    }
    if f_high.is_zero() {
        return Some((high, 0));
    }
    if f_low.is_sign_negative() == f_high.is_sign_negative() {
        return None;
    }

    for step in 1..=MAX_BISECTION_ITERATIONS {
        let mid = (low + high) / dec!(2);
        let f_mid = npv(mid, cash_flows)?;
        if f_mid.is_zero() || (high - low) / dec!(2) < BISECTION_TOLERANCE {
            return Some((mid, step));
        }
        if f_mid.is_sign_negative() == f_low.is_sign_negative() {
            low = mid;
            f_low = f_mid;
        } else {
            high = mid;
        }
    }

    Some(((low + high) / dec!(2), MAX_BISECTION_ITERATIONS))
}

// ---------------------------------------------------------------------------
// Return helpers
// ---------------------------------------------------------------------------

/// Cumulative return on `invested` from the post-acquisition `flows`, as a percentage.
pub fn total_roi(invested: Money, flows: &[Money]) -> Option<Percent> {
    if invested <= Decimal::ZERO {
        return None;
    }
    let total: Money = flows.iter().copied().sum();
    Some((total - invested) / invested * dec!(100))
}

/// Compound annual return implied by ending with `invested + sum(flows)`.
pub fn annualized_roi(invested: Money, flows: &[Money]) -> Option<Percent> {
    if invested <= Decimal::ZERO || flows.is_empty() {
        return None;
    }
    let ending = invested + flows.iter().copied().sum::<Money>();
    if ending <= Decimal::ZERO {
        return None;
    }
    let exponent = Decimal::ONE / Decimal::from(flows.len() as u64);
    let growth = (ending / invested).checked_powd(exponent)?;
    Some((growth - Decimal::ONE) * dec!(100))
}

/// Years until cumulative undiscounted flows recover `invested`, interpolated
/// within the recovery year.
pub fn payback_period(invested: Money, flows: &[Money]) -> Option<Decimal> {
    payback(invested, flows.iter().copied())
}

/// Payback on flows discounted at `rate` (flow `t` discounted `t + 1` periods).
pub fn discounted_payback(invested: Money, flows: &[Money], rate: Rate) -> Option<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut discount = Decimal::ONE;
    let discounted: Vec<Money> = flows
        .iter()
        .map(|cf| {
            discount /= one_plus_r;
            *cf * discount
        })
        .collect();
    payback(invested, discounted.into_iter())
}

fn payback(invested: Money, flows: impl Iterator<Item = Money>) -> Option<Decimal> {
    if invested <= Decimal::ZERO {
        return None;
    }
    let mut cumulative = Decimal::ZERO;
    for (t, cf) in flows.enumerate() {
        let before = cumulative;
        cumulative += cf;
        if cumulative >= invested {
            let fraction = if cf.is_zero() {
                Decimal::ONE
            } else {
                (invested - before) / cf
            };
            return Some(Decimal::from(t as u64) + fraction);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irr_two_period() {
        // -100 today, 110 in a year: exactly 10%
        let irr = solve_irr(&[dec!(-100), dec!(110)], DEFAULT_IRR_GUESS);
        assert!((irr - dec!(10)).abs() < dec!(0.01), "Expected 10%, got {irr}");
    }

    #[test]
    fn test_irr_level_annuity() {
        // -1000 then 5 x 300: ~15.24%
        let flows = [dec!(-1000), dec!(300), dec!(300), dec!(300), dec!(300), dec!(300)];
        let solution = solve_irr_detailed(&flows, DEFAULT_IRR_GUESS);
        assert!(solution.converged);
        assert_eq!(solution.method, IrrMethod::NewtonRaphson);
        assert!(
            (solution.rate_pct - dec!(15.24)).abs() < dec!(0.01),
            "Expected ~15.24%, got {}",
            solution.rate_pct
        );
    }

    #[test]
    fn test_irr_negative_return() {
        // Recover only 900 of 1000 after one year: -10%
        let irr = solve_irr(&[dec!(-1000), dec!(900)], DEFAULT_IRR_GUESS);
        assert!((irr - dec!(-10)).abs() < dec!(0.01), "Expected -10%, got {irr}");
    }

    #[test]
    fn test_irr_too_few_flows() {
        let solution = solve_irr_detailed(&[dec!(-100)], DEFAULT_IRR_GUESS);
        assert_eq!(solution.rate_pct, Decimal::ZERO);
        assert!(!solution.converged);
        assert_eq!(solve_irr(&[], DEFAULT_IRR_GUESS), Decimal::ZERO);
    }

    #[test]
    fn test_irr_falls_back_to_bisection() {
        // From a guess of 900% Newton overshoots below -99% on the first step;
        // the bracket [-0.99, 10] still holds the 10% root.
        let solution = solve_irr_detailed(&[dec!(-100), dec!(110)], dec!(9));
        assert!(solution.converged);
        assert!(
            (solution.rate_pct - dec!(10)).abs() < dec!(0.01),
            "Expected 10%, got {}",
            solution.rate_pct
        );
    }

    #[test]
    fn test_irr_no_sign_change_is_best_effort() {
        // All-positive flows have no root
        let solution = solve_irr_detailed(&[dec!(100), dec!(100), dec!(100)], DEFAULT_IRR_GUESS);
        assert!(!solution.converged);
        assert_eq!(solution.method, IrrMethod::BestEffort);
        assert!(solution.rate_pct >= dec!(-99) && solution.rate_pct <= dec!(1000));
    }

    #[test]
    fn test_npv_basic() {
        let flows = [dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let value = npv(dec!(0.10), &flows).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 = -21.04
        assert!((value - dec!(-21.04)).abs() < dec!(0.01));
        assert!(npv(dec!(-1), &flows).is_none());
    }

    #[test]
    fn test_roi_helpers() {
        let flows = [dec!(300), dec!(400), dec!(500)];
        // (1200 - 1000) / 1000 = 20%
        assert_eq!(total_roi(dec!(1000), &flows), Some(dec!(20)));
        assert_eq!(total_roi(Decimal::ZERO, &flows), None);

        // Ending 2200 on 1000 over 3 years: 2.2^(1/3) - 1 = 30.06%
        let annualized = annualized_roi(dec!(1000), &flows).unwrap();
        assert!((annualized - dec!(30.06)).abs() < dec!(0.01), "got {annualized}");
    }

    #[test]
    fn test_payback() {
        let flows = [dec!(300), dec!(400), dec!(500)];
        // 700 recovered after 2 years, remaining 300 of 500 in year 3
        assert_eq!(payback_period(dec!(1000), &flows), Some(dec!(2.6)));
        assert_eq!(payback_period(dec!(5000), &flows), None);

        let discounted = discounted_payback(dec!(1000), &flows, dec!(0.10));
        assert!(discounted.is_none(), "PV of flows is below 1000 at 10%");
        assert!(discounted_payback(dec!(900), &flows, dec!(0.10)).is_some());
    }
}
