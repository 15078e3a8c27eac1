//! Filtering by dynamic programming over aggregate costs.
//!
//! The filter only assumes that each cost curve is non-decreasing. The
//! attainable costs of a variable are grouped into runs of consecutive
//! integers. A backward pass builds, for every suffix of the variables, the
//! set of partial costs from which the suffix can still bring the total into
//! the threshold. A forward pass then walks the variables in order, keeping
//! the set of partial costs reachable so far. All sets are capped at the
//! threshold maximum and stored as bit-packed [`CostSet`]s.
//!
//! A cost `c` of variable `i` is supported when some reachable partial cost
//! `t` has `t + c` in the backward set of `i + 1`. The cheapest and dearest
//! supported cost of a run are found in a single sweep over that backward
//! set, so each variable costs `O(r * cap)` for `r` runs, on top of one scan
//! over its quantity units.

use log::{debug, trace};

use super::cost_set::CostSet;
use super::{check_inputs, CostThreshold, FilterError, MinCostFilter, QuantityBounds, Result, StochasticVariable};

#[derive(Debug, Default, Copy, Clone)]
pub struct PseudoLinearFilter;

/// Inclusive run of consecutive costs.
type Run = (usize, usize);

/// Groups ascending costs into maximal runs of consecutive values.
fn runs(costs: impl IntoIterator<Item = usize>) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for c in costs {
        match runs.last_mut() {
            Some((_, hi)) if c <= *hi + 1 => *hi = (*hi).max(c),
            _ => runs.push((c, c)),
        }
    }
    runs
}

/// Runs of costs `var` attains over its quantity bounds, up to `cap`.
fn cost_runs(var: &StochasticVariable, cap: usize) -> Vec<Run> {
    let bounds = var.quantity();
    runs(
        (bounds.min..=bounds.max)
            .map(|q| var.cost(q) as usize)
            .take_while(|&c| c <= cap),
    )
}

/// Cheapest and dearest `c` in `run` with `t - c` in `reached` for some `t`
/// in `target`.
fn supported_in_run(reached: &CostSet, target: &CostSet, (lo, hi): Run) -> Option<Run> {
    let mut cheapest: Option<usize> = None;
    let mut dearest: Option<usize> = None;

    // Largest member of `reached` at most `t - lo`.
    let mut below: Option<usize> = None;
    let mut below_cursor = 0;
    // Smallest member of `reached` in `[t - hi, t - lo]`.
    let mut above: Option<usize> = None;
    let mut above_cursor = 0;

    for t in target.iter() {
        if t < lo {
            continue;
        }
        let upper = t - lo;
        while below_cursor <= upper {
            if reached.contains(below_cursor) {
                below = Some(below_cursor);
            }
            below_cursor += 1;
        }
        if let Some(p) = below {
            if t - p <= hi {
                cheapest = Some(cheapest.map_or(t - p, |c| c.min(t - p)));
            }
        }

        let lower = t.saturating_sub(hi);
        if above.map_or(true, |a| a < lower) {
            above = None;
            above_cursor = above_cursor.max(lower);
        }
        while above.is_none() && above_cursor <= upper {
            if reached.contains(above_cursor) {
                above = Some(above_cursor);
            } else {
                above_cursor += 1;
            }
        }
        if let Some(a) = above {
            dearest = Some(dearest.map_or(t - a, |c| c.max(t - a)));
        }
    }

    cheapest.zip(dearest)
}

/// First quantity of `var` costing `cheapest` and last one costing `dearest`.
fn quantity_span(var: &StochasticVariable, cheapest: usize, dearest: usize) -> Result<QuantityBounds> {
    let bounds = var.quantity();
    let mut lower = None;
    let mut upper = None;
    for q in bounds.min..=bounds.max {
        let c = var.cost(q) as usize;
        if c > dearest {
            break;
        }
        if c == cheapest && lower.is_none() {
            lower = Some(q);
        }
        if c == dearest {
            upper = Some(q);
        }
    }
    match (lower, upper) {
        (Some(lower), Some(upper)) => Ok(QuantityBounds::new(lower, upper)),
        _ => Err(FilterError::Infeasible),
    }
}

impl MinCostFilter for PseudoLinearFilter {
    fn filter(&self, vars: &[StochasticVariable], threshold: CostThreshold) -> Result<Vec<QuantityBounds>> {
        check_inputs(vars, threshold)?;
        if threshold.max < 0 {
            return Err(FilterError::Infeasible);
        }
        let total_high: i64 = vars.iter().map(|v| v.cost(v.quantity().max)).sum();
        let cap = threshold.max.min(total_high) as usize;
        let floor = threshold.min.max(0) as usize;
        if floor > cap {
            return Err(FilterError::Infeasible);
        }

        let runs: Vec<Vec<Run>> = vars.iter().map(|v| cost_runs(v, cap)).collect();
        let n = vars.len();

        // completes[i]: partial costs of the first `i` variables that the rest can finish.
        let mut completes = vec![CostSet::range(cap, floor, cap); n + 1];
        for i in (0..n).rev() {
            let mut set = CostSet::new(cap);
            for &(lo, hi) in &runs[i] {
                set.union_with(&completes[i + 1].preimage(lo, hi));
            }
            completes[i] = set;
        }
        if !completes[0].contains(0) {
            return Err(FilterError::Infeasible);
        }

        let mut reached = CostSet::zero(cap);
        let mut result = Vec::with_capacity(n);
        for (i, var) in vars.iter().enumerate() {
            let (cheapest, dearest) = runs[i]
                .iter()
                .filter_map(|&run| supported_in_run(&reached, &completes[i + 1], run))
                .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
                .ok_or(FilterError::Infeasible)?;
            let supported = quantity_span(var, cheapest, dearest)?;
            trace!(
                "variable {}: costs [{}, {}], quantities [{}, {}]",
                i,
                cheapest,
                dearest,
                supported.min,
                supported.max
            );
            result.push(supported);

            let mut next = CostSet::new(cap);
            for &(lo, hi) in &runs[i] {
                next.union_with(&reached.dilated(lo, hi));
            }
            reached = next;
        }

        debug!("pseudo-linear: {} variables, cost cap {}", n, cap);
        Ok(result)
    }
}
