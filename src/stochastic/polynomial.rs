//! Closed-form filtering.
//!
//! For variable `i`, the other variables can together reach any total cost
//! between the sum of their low costs and the sum of their high costs. The
//! admissible costs of `i` are therefore the window
//!
//! ```text
//! [Tmin - others_high, Tmax - others_low]
//! ```
//!
//! and its quantity bounds are found by inverting the cost curve at both
//! ends. Each inversion is a single scan over the sorted outcomes, so the
//! whole filter runs in `O(n * k)` for `n` variables with `k` outcomes each.

use log::debug;

use super::{check_inputs, CostThreshold, FilterError, MinCostFilter, QuantityBounds, Result, StochasticVariable};

#[derive(Debug, Default, Copy, Clone)]
pub struct PolynomialFilter;

/// Cost range of every variable over its quantity bounds, and their sums.
///
/// Because each cost curve moves by at most 1 per quantity unit, the
/// attainable total cost of any subset of the variables is every integer
/// between the sum of their low costs and the sum of their high costs.
#[derive(Debug)]
struct Envelope {
    low: Vec<i64>,
    high: Vec<i64>,
    sum_low: i64,
    sum_high: i64,
    threshold: CostThreshold,
}

impl Envelope {
    fn new(vars: &[StochasticVariable], threshold: CostThreshold) -> Result<Self> {
        let low: Vec<i64> = vars.iter().map(|v| v.cost(v.quantity().min)).collect();
        let high: Vec<i64> = vars.iter().map(|v| v.cost(v.quantity().max)).collect();
        let sum_low = low.iter().sum();
        let sum_high = high.iter().sum();
        if sum_low > threshold.max || sum_high < threshold.min {
            return Err(FilterError::Infeasible);
        }
        Ok(Self {
            low,
            high,
            sum_low,
            sum_high,
            threshold,
        })
    }

    /// Costs variable `i` may take so that the others can complete the total.
    fn window(&self, i: usize) -> (i64, i64) {
        let others_low = self.sum_low - self.low[i];
        let others_high = self.sum_high - self.high[i];
        (
            self.threshold.min - others_high,
            self.threshold.max - others_low,
        )
    }
}


impl MinCostFilter for PolynomialFilter {
    fn filter(&self, vars: &[StochasticVariable], threshold: CostThreshold) -> Result<Vec<QuantityBounds>> {
        check_inputs(vars, threshold)?;
        let envelope = Envelope::new(vars, threshold)?;

        let mut result = Vec::with_capacity(vars.len());
        for (i, var) in vars.iter().enumerate() {
            let (c_lo, c_hi) = envelope.window(i);
            let bounds = var.quantity();
            let upper = var
                .max_quantity_within(c_hi)
                .ok_or(FilterError::Infeasible)?
                .min(bounds.max);
            let lower = var
                .min_quantity_reaching(c_lo)
                .ok_or(FilterError::Infeasible)?
                .max(bounds.min);
            if lower > upper {
                return Err(FilterError::Infeasible);
            }
            result.push(QuantityBounds::new(lower, upper));
        }

        debug!(
            "polynomial: {} variables, threshold [{}, {}], cost envelope [{}, {}]",
            vars.len(),
            threshold.min,
            threshold.max,
            envelope.sum_low,
            envelope.sum_high
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::stochastic::Outcome;

    fn sample() -> Vec<StochasticVariable> {
        vec![
            StochasticVariable::new(1, [Outcome::new(2, 5), Outcome::new(6, 5)]).unwrap(),
            StochasticVariable::new(1, [Outcome::new(10, 10)]).unwrap(),
        ]
    }

    #[test]
    fn test_polynomial_window() {
        let bounds = PolynomialFilter
            .filter(&sample(), CostThreshold::new(5, 6))
            .unwrap();
        assert_eq!(bounds, vec![QuantityBounds::new(0, 10), QuantityBounds::new(1, 6)]);
    }

    #[test]
    fn test_polynomial_after_tightening() {
        let mut vars = sample();
        vars[0].restrict(QuantityBounds::new(7, 10)).unwrap();
        let bounds = PolynomialFilter
            .filter(&vars, CostThreshold::new(5, 6))
            .unwrap();
        assert_eq!(bounds, vec![QuantityBounds::new(7, 10), QuantityBounds::new(1, 3)]);
    }

    #[test]
    fn test_polynomial_infeasible() {
        assert_eq!(
            PolynomialFilter.filter(&sample(), CostThreshold::new(50, 60)),
            Err(FilterError::Infeasible)
        );
        assert_eq!(
            PolynomialFilter.filter(&sample(), CostThreshold::new(-5, -1)),
            Err(FilterError::Infeasible)
        );
    }

    #[test]
    fn test_polynomial_no_variables() {
        assert_eq!(PolynomialFilter.filter(&[], CostThreshold::new(-1, 3)), Ok(vec![]));
        assert_eq!(
            PolynomialFilter.filter(&[], CostThreshold::new(1, 3)),
            Err(FilterError::Infeasible)
        );
    }
}
