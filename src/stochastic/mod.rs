//! Stochastic cost filtering.
//!
//! A [`StochasticVariable`] is a discrete random variable over unit costs:
//! each [`Outcome`] has a `value` (a cost per unit of quantity, as a fraction
//! in `[0, 1]`) and a `probability`, both scaled by `10^precision`. The
//! quantity of a variable is an amount of probability mass `q` in
//! `[0, 10^precision]`, and its cost is the expected cost of the cheapest `q`
//! units of mass:
//!
//! ```text
//! cost(q) = ceil(E(q) / 10^p),  E(q) = sum of value * mass over the cheapest q units
//! ```
//!
//! `cost` is non-decreasing and grows by at most 1 per quantity unit. Given
//! an aggregate [`CostThreshold`], a [`MinCostFilter`] computes for every
//! variable the tightest [`QuantityBounds`] such that every value inside
//! takes part in some assignment whose total cost is within the threshold.
//!
//! Three filters are provided and always return identical bounds:
//!
//! | Filter | Technique |
//! |--------|-----------|
//! | [`PseudoLinearFilter`][pseudo_linear::PseudoLinearFilter] | dynamic program over attainable aggregate costs |
//! | [`PolynomialFilter`][polynomial::PolynomialFilter] | closed-form inversion of each cost curve |
//! | [`DichotomousFilter`][dichotomous::DichotomousFilter] | bisection against a feasibility test |
//!
//! # Example
//!
//! ```
//! use mdd_rs::stochastic::polynomial::PolynomialFilter;
//! use mdd_rs::stochastic::{CostThreshold, MinCostFilter, Outcome, QuantityBounds, StochasticVariable};
//!
//! // Precision 1: quantities and costs are tenths.
//! let cheap = StochasticVariable::new(1, [Outcome::new(2, 5), Outcome::new(6, 5)]).unwrap();
//! let flat = StochasticVariable::new(1, [Outcome::new(10, 10)]).unwrap();
//!
//! let bounds = PolynomialFilter
//!     .filter(&[cheap, flat], CostThreshold::new(5, 6))
//!     .unwrap();
//! assert_eq!(bounds[1], QuantityBounds::new(1, 6));
//! ```

use log::debug;
use thiserror::Error;

pub mod cost_set;
pub mod dichotomous;
pub mod polynomial;
pub mod pseudo_linear;

/// Largest supported number of decimal digits.
pub const MAX_PRECISION: u32 = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("precision {0} exceeds the maximum of {MAX_PRECISION}")]
    InvalidPrecision(u32),

    #[error("invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("invalid quantity bounds [{min}, {max}] for scale {scale}")]
    InvalidQuantity { min: u64, max: u64, scale: u64 },

    #[error("variables mix precisions {expected} and {found}")]
    PrecisionMismatch { expected: u32, found: u32 },

    #[error("invalid cost threshold [{min}, {max}]")]
    InvalidThreshold { min: i64, max: i64 },

    #[error("no assignment meets the cost threshold")]
    Infeasible,

    #[error("expected {expected} bounds, got {found}")]
    LengthMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, FilterError>;

/// One value of a discrete distribution, scaled by `10^precision`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Outcome {
    pub value: u64,
    pub probability: u64,
}

impl Outcome {
    pub const fn new(value: u64, probability: u64) -> Self {
        Self { value, probability }
    }
}

/// Inclusive range of quantities.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct QuantityBounds {
    pub min: u64,
    pub max: u64,
}

impl QuantityBounds {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, q: u64) -> bool {
        self.min <= q && q <= self.max
    }
}

/// Inclusive range of admissible aggregate costs, scaled like the variables.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CostThreshold {
    pub min: i64,
    pub max: i64,
}

impl CostThreshold {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StochasticVariable {
    precision: u32,
    /// Sorted by ascending value, no zero-probability entries.
    outcomes: Vec<Outcome>,
    quantity: QuantityBounds,
}

impl StochasticVariable {
    /// Create a variable whose quantity spans the whole mass `[0, 10^precision]`.
    ///
    /// Probabilities must add up to `10^precision` and no value may exceed it.
    pub fn new(precision: u32, outcomes: impl IntoIterator<Item = Outcome>) -> Result<Self> {
        if precision > MAX_PRECISION {
            return Err(FilterError::InvalidPrecision(precision));
        }
        let scale = 10u64.pow(precision);

        let mut outcomes: Vec<Outcome> = outcomes
            .into_iter()
            .filter(|o| o.probability > 0)
            .collect();
        if let Some(o) = outcomes.iter().find(|o| o.value > scale) {
            return Err(FilterError::InvalidDistribution(format!(
                "value {} exceeds scale {}",
                o.value, scale
            )));
        }
        let total: u64 = outcomes.iter().map(|o| o.probability).sum();
        if total != scale {
            return Err(FilterError::InvalidDistribution(format!(
                "probabilities sum to {}, expected {}",
                total, scale
            )));
        }
        outcomes.sort_by_key(|o| o.value);

        Ok(Self {
            precision,
            outcomes,
            quantity: QuantityBounds::new(0, scale),
        })
    }

    pub fn with_quantity(mut self, bounds: QuantityBounds) -> Result<Self> {
        self.set_quantity(bounds)?;
        Ok(self)
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn scale(&self) -> u64 {
        10u64.pow(self.precision)
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn quantity(&self) -> QuantityBounds {
        self.quantity
    }

    pub fn set_quantity(&mut self, bounds: QuantityBounds) -> Result<()> {
        let scale = self.scale();
        if bounds.min > bounds.max || bounds.max > scale {
            return Err(FilterError::InvalidQuantity {
                min: bounds.min,
                max: bounds.max,
                scale,
            });
        }
        self.quantity = bounds;
        Ok(())
    }

    /// Intersect the quantity bounds with `bounds`.
    pub fn restrict(&mut self, bounds: QuantityBounds) -> Result<()> {
        self.quantity = self.restricted(bounds)?;
        Ok(())
    }

    fn restricted(&self, bounds: QuantityBounds) -> Result<QuantityBounds> {
        let min = self.quantity.min.max(bounds.min);
        let max = self.quantity.max.min(bounds.max);
        if min > max {
            return Err(FilterError::Infeasible);
        }
        Ok(QuantityBounds::new(min, max))
    }

    /// Expected cost of the cheapest `q` units of mass, scaled by `10^(2p)`.
    pub fn partial_expectation(&self, q: u64) -> u128 {
        let mut left = q;
        let mut total = 0u128;
        for o in &self.outcomes {
            if left == 0 {
                break;
            }
            let taken = left.min(o.probability);
            total += taken as u128 * o.value as u128;
            left -= taken;
        }
        total
    }

    pub fn cost(&self, q: u64) -> i64 {
        let scale = self.scale() as u128;
        self.partial_expectation(q).div_ceil(scale) as i64
    }

    /// Largest quantity in `[0, scale]` whose cost is at most `budget`.
    pub fn max_quantity_within(&self, budget: i64) -> Option<u64> {
        if budget < 0 {
            return None;
        }
        let cap = budget as u128 * self.scale() as u128;
        let (mut acc_q, mut acc_e) = (0u64, 0u128);
        for o in &self.outcomes {
            let segment = o.value as u128 * o.probability as u128;
            if acc_e + segment > cap {
                // `segment > 0`, hence `o.value > 0`.
                let extra = (cap - acc_e) / o.value as u128;
                return Some(acc_q + extra as u64);
            }
            acc_q += o.probability;
            acc_e += segment;
        }
        Some(acc_q)
    }

    /// Smallest quantity in `[0, scale]` whose cost is at least `target`.
    pub fn min_quantity_reaching(&self, target: i64) -> Option<u64> {
        if target <= 0 {
            return Some(0);
        }
        // cost(q) >= target  <=>  E(q) > (target - 1) * scale
        let floor = (target - 1) as u128 * self.scale() as u128;
        let (mut acc_q, mut acc_e) = (0u64, 0u128);
        for o in &self.outcomes {
            let segment = o.value as u128 * o.probability as u128;
            if acc_e + segment > floor {
                let extra = (floor - acc_e) / o.value as u128 + 1;
                return Some(acc_q + extra as u64);
            }
            acc_q += o.probability;
            acc_e += segment;
        }
        None
    }
}

pub trait MinCostFilter {
    /// Tightest quantity bounds consistent with the aggregate threshold, in
    /// the order of `vars`. Fails with [`FilterError::Infeasible`] when no
    /// assignment within the current bounds meets the threshold.
    fn filter(&self, vars: &[StochasticVariable], threshold: CostThreshold) -> Result<Vec<QuantityBounds>>;
}

/// Tighten every variable to the matching bounds.
///
/// Either every variable is tightened or, on error, none is.
pub fn apply_bounds(vars: &mut [StochasticVariable], bounds: &[QuantityBounds]) -> Result<()> {
    if vars.len() != bounds.len() {
        return Err(FilterError::LengthMismatch {
            expected: vars.len(),
            found: bounds.len(),
        });
    }
    let tightened: Vec<QuantityBounds> = vars
        .iter()
        .zip(bounds)
        .map(|(var, &b)| var.restricted(b))
        .collect::<Result<_>>()?;
    for (var, q) in vars.iter_mut().zip(tightened) {
        var.quantity = q;
    }
    debug!("apply_bounds: tightened {} variables", vars.len());
    Ok(())
}

fn check_inputs(vars: &[StochasticVariable], threshold: CostThreshold) -> Result<()> {
    if threshold.min > threshold.max {
        return Err(FilterError::InvalidThreshold {
            min: threshold.min,
            max: threshold.max,
        });
    }
    if let Some(first) = vars.first() {
        if let Some(other) = vars.iter().find(|v| v.precision != first.precision) {
            return Err(FilterError::PrecisionMismatch {
                expected: first.precision,
                found: other.precision,
            });
        }
    }
    Ok(())
}
