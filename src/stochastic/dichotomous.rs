//! Filtering by bisection.
//!
//! Bounds are refined in place, one variable at a time. For variable `i`,
//! the others currently reach every total cost between the sum of their low
//! costs and the sum of their high costs. A quantity `q` fits under the
//! threshold when `cost(q)` plus the others' low total stays at most the
//! maximum, and reaches it when `cost(q)` plus the others' high total is at
//! least the minimum. Both tests are monotone in `q`, so each end of the
//! range is found by bisection. A tightened variable immediately narrows
//! the ranges seen by the next ones. Passes repeat until the bounds stop
//! changing or the pass budget runs out.

use log::{debug, trace};

use super::{check_inputs, CostThreshold, FilterError, MinCostFilter, QuantityBounds, Result, StochasticVariable};

#[derive(Debug, Copy, Clone)]
pub struct DichotomousFilter {
    /// Upper bound on refinement passes.
    pub max_passes: usize,
}

impl Default for DichotomousFilter {
    fn default() -> Self {
        Self { max_passes: 8 }
    }
}

impl DichotomousFilter {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }
}

/// Largest `q` in `[lo, hi]` satisfying `pred`, given `pred(lo)` and that
/// `pred` turns false at most once.
fn bisect_last(mut lo: u64, mut hi: u64, pred: impl Fn(u64) -> bool) -> u64 {
    while lo < hi {
        let mid = lo + (hi - lo + 1) / 2;
        if pred(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Smallest `q` in `[lo, hi]` satisfying `pred`, given `pred(hi)` and that
/// `pred` turns true at most once.
fn bisect_first(mut lo: u64, mut hi: u64, pred: impl Fn(u64) -> bool) -> u64 {
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Current bounds of every variable with their low and high costs.
struct CostRanges<'a> {
    vars: &'a [StochasticVariable],
    bounds: Vec<QuantityBounds>,
    low: Vec<i64>,
    high: Vec<i64>,
    sum_low: i64,
    sum_high: i64,
}

impl<'a> CostRanges<'a> {
    fn new(vars: &'a [StochasticVariable]) -> Self {
        let bounds: Vec<QuantityBounds> = vars.iter().map(|v| v.quantity()).collect();
        let low: Vec<i64> = vars.iter().zip(&bounds).map(|(v, b)| v.cost(b.min)).collect();
        let high: Vec<i64> = vars.iter().zip(&bounds).map(|(v, b)| v.cost(b.max)).collect();
        Self {
            vars,
            sum_low: low.iter().sum(),
            sum_high: high.iter().sum(),
            bounds,
            low,
            high,
        }
    }

    /// Total cost range of every variable but `i`.
    fn others(&self, i: usize) -> (i64, i64) {
        (self.sum_low - self.low[i], self.sum_high - self.high[i])
    }

    fn tighten(&mut self, i: usize, bounds: QuantityBounds) {
        let var = &self.vars[i];
        let (low, high) = (var.cost(bounds.min), var.cost(bounds.max));
        self.sum_low += low - self.low[i];
        self.sum_high += high - self.high[i];
        self.low[i] = low;
        self.high[i] = high;
        self.bounds[i] = bounds;
    }
}

impl MinCostFilter for DichotomousFilter {
    fn filter(&self, vars: &[StochasticVariable], threshold: CostThreshold) -> Result<Vec<QuantityBounds>> {
        check_inputs(vars, threshold)?;
        let mut ranges = CostRanges::new(vars);
        if ranges.sum_low > threshold.max || ranges.sum_high < threshold.min {
            return Err(FilterError::Infeasible);
        }

        let mut passes = 0;
        while passes < self.max_passes.max(1) {
            passes += 1;
            let mut changed = false;

            for (i, var) in vars.iter().enumerate() {
                let (others_low, others_high) = ranges.others(i);
                let fits = |q: u64| var.cost(q) + others_low <= threshold.max;
                let reaches = |q: u64| var.cost(q) + others_high >= threshold.min;

                let b = ranges.bounds[i];
                if !fits(b.min) || !reaches(b.max) {
                    return Err(FilterError::Infeasible);
                }
                let upper = bisect_last(b.min, b.max, fits);
                let lower = bisect_first(b.min, b.max, reaches);
                if lower > upper {
                    return Err(FilterError::Infeasible);
                }
                let tightened = QuantityBounds::new(lower, upper);
                if tightened != b {
                    trace!("pass {}: variable {} [{}, {}] -> [{}, {}]", passes, i, b.min, b.max, lower, upper);
                    ranges.tighten(i, tightened);
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        debug!("dichotomous: {} variables, {} passes", vars.len(), passes);
        Ok(ranges.bounds)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::stochastic::polynomial::PolynomialFilter;
    use crate::stochastic::Outcome;

    #[test]
    fn test_bisect() {
        let squares = |q: u64| q * q;
        assert_eq!(bisect_last(0, 100, |q| squares(q) <= 50), 7);
        assert_eq!(bisect_first(0, 100, |q| squares(q) >= 50), 8);
        assert_eq!(bisect_last(3, 3, |_| true), 3);
        assert_eq!(bisect_first(0, 9, |_| true), 0);
    }

    #[test]
    fn test_dichotomous_matches_closed_form() {
        let vars = vec![
            StochasticVariable::new(2, [Outcome::new(15, 30), Outcome::new(70, 50), Outcome::new(100, 20)]).unwrap(),
            StochasticVariable::new(2, [Outcome::new(40, 100)]).unwrap(),
            StochasticVariable::new(2, [Outcome::new(0, 60), Outcome::new(90, 40)])
                .unwrap()
                .with_quantity(QuantityBounds::new(50, 90))
                .unwrap(),
        ];
        for (min, max) in [(0, 10), (30, 45), (60, 70), (100, 120)] {
            let threshold = CostThreshold::new(min, max);
            assert_eq!(
                DichotomousFilter::default().filter(&vars, threshold),
                PolynomialFilter.filter(&vars, threshold),
                "threshold [{}, {}]",
                min,
                max
            );
        }
    }

    #[test]
    fn test_dichotomous_single_pass_budget() {
        let vars = vec![
            StochasticVariable::new(1, [Outcome::new(2, 5), Outcome::new(6, 5)]).unwrap(),
            StochasticVariable::new(1, [Outcome::new(10, 10)]).unwrap(),
        ];
        let threshold = CostThreshold::new(5, 6);
        let bounds = DichotomousFilter::new(1).filter(&vars, threshold).unwrap();
        assert_eq!(bounds, vec![QuantityBounds::new(0, 10), QuantityBounds::new(1, 6)]);
        assert_eq!(DichotomousFilter::new(0).filter(&vars, threshold), Ok(bounds));
    }

    #[test]
    fn test_tightening_narrows_later_variables() {
        // cost(q) = q for each variable.
        let vars = vec![
            StochasticVariable::new(1, [Outcome::new(10, 10)]).unwrap(),
            StochasticVariable::new(1, [Outcome::new(10, 10)]).unwrap(),
        ];
        let mut ranges = CostRanges::new(&vars);
        assert_eq!(ranges.others(0), (0, 10));

        ranges.tighten(0, QuantityBounds::new(3, 4));
        assert_eq!((ranges.sum_low, ranges.sum_high), (3, 14));
        assert_eq!(ranges.others(1), (3, 4));
        assert_eq!(
            DichotomousFilter::default().filter(&vars, CostThreshold::new(15, 20)),
            Ok(vec![QuantityBounds::new(5, 10); 2])
        );
    }

    #[test]
    fn test_dichotomous_infeasible() {
        let vars = vec![StochasticVariable::new(0, [Outcome::new(1, 1)]).unwrap()];
        assert_eq!(
            DichotomousFilter::default().filter(&vars, CostThreshold::new(2, 3)),
            Err(FilterError::Infeasible)
        );
        assert_eq!(
            DichotomousFilter::default().filter(&vars, CostThreshold::new(1, 1)),
            Ok(vec![QuantityBounds::new(1, 1)])
        );
    }
}
