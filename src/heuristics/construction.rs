use crate::heuristics::coverage::{cover_order, cover_order_fully};
use crate::instance::WaveInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &WaveInstance, rng: &mut ChaCha8Rng) -> Solution;
    fn name(&self) -> &str;
}

/// Units per aisle, 0 when no aisle is open yet
#[inline]
pub(crate) fn ratio(units: i64, num_aisles: usize) -> f64 {
    if num_aisles == 0 {
        0.0
    } else {
        units as f64 / num_aisles as f64
    }
}

/// Candidate order evaluated during the growth phase
#[derive(Debug, Clone)]
struct OrderDelta {
    order: usize,
    ratio: f64,
    added_aisles: BTreeSet<usize>,
}

/// GRASP construction
///
/// Starts from a random order and grows the wave with orders drawn from a
/// restricted candidate list of the best would-be ratios, as long as the
/// pick improves the running ratio and the wave is below its lower bound.
/// A repair pass then forces the largest remaining orders in until the
/// lower bound is met.
pub struct GraspConstruction {
    /// Share of the sorted candidates kept in the RCL (at least one)
    pub rcl_fraction: f64,
}

impl GraspConstruction {
    pub fn new() -> Self {
        GraspConstruction { rcl_fraction: 0.3 }
    }

    pub fn with_rcl_fraction(rcl_fraction: f64) -> Self {
        GraspConstruction { rcl_fraction }
    }

    /// Pure greedy variant: the RCL always holds the single best candidate
    pub fn greedy() -> Self {
        GraspConstruction { rcl_fraction: 0.0 }
    }

    fn rcl_size(&self, candidates: usize) -> usize {
        ((candidates as f64 * self.rcl_fraction) as usize).clamp(1, candidates.max(1))
    }

    fn candidates(
        &self,
        instance: &WaveInstance,
        orders: &BTreeSet<usize>,
        aisles: &BTreeSet<usize>,
        units: i64,
    ) -> Vec<OrderDelta> {
        let mut deltas: Vec<OrderDelta> = (0..instance.num_orders())
            .filter(|o| !orders.contains(o))
            .filter(|&o| units + instance.units(o) <= instance.wave_size_ub)
            .map(|o| {
                let added_aisles = cover_order(instance, o, aisles);
                let ratio = ratio(units + instance.units(o), aisles.len() + added_aisles.len());
                OrderDelta { order: o, ratio, added_aisles }
            })
            .collect();

        deltas.sort_by_key(|d| std::cmp::Reverse(OrderedFloat(d.ratio)));
        deltas
    }

    /// Force the largest remaining orders in until the lower bound is met
    fn repair(
        &self,
        instance: &WaveInstance,
        orders: &mut BTreeSet<usize>,
        aisles: &mut BTreeSet<usize>,
        units: &mut i64,
    ) {
        let mut pending: Vec<usize> = (0..instance.num_orders())
            .filter(|o| !orders.contains(o))
            .collect();
        pending.sort_by_key(|&o| std::cmp::Reverse(instance.units(o)));

        for o in pending {
            if *units >= instance.wave_size_lb {
                break;
            }
            if *units + instance.units(o) > instance.wave_size_ub {
                continue;
            }
            let added = cover_order(instance, o, aisles);
            aisles.extend(added);
            orders.insert(o);
            *units += instance.units(o);
        }
    }
}

impl Default for GraspConstruction {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for GraspConstruction {
    fn construct(&self, instance: &WaveInstance, rng: &mut ChaCha8Rng) -> Solution {
        let start = std::time::Instant::now();

        if instance.num_orders() == 0 {
            return Solution::from_sets(instance, BTreeSet::new(), BTreeSet::new(), self.name());
        }

        let first = rng.gen_range(0..instance.num_orders());
        let mut orders = BTreeSet::from([first]);
        let mut aisles = cover_order(instance, first, &BTreeSet::new());
        let mut units = instance.units(first);
        let mut current_ratio = ratio(units, aisles.len());
        let mut iterations = 0;

        while units < instance.wave_size_lb {
            iterations += 1;
            let deltas = self.candidates(instance, &orders, &aisles, units);
            if deltas.is_empty() {
                break;
            }

            let k = self.rcl_size(deltas.len());
            let pick = &deltas[rng.gen_range(0..k)];
            if pick.ratio <= current_ratio {
                break;
            }

            orders.insert(pick.order);
            aisles.extend(pick.added_aisles.iter().copied());
            units += instance.units(pick.order);
            current_ratio = pick.ratio;
        }

        if units < instance.wave_size_lb {
            self.repair(instance, &mut orders, &mut aisles, &mut units);
        }

        let mut solution = Solution::from_sets(instance, orders, aisles, self.name());
        if !solution.feasible {
            solution = single_order_solution(instance, 0, self.name());
        }

        solution.iterations = Some(iterations);
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    fn name(&self) -> &str {
        if self.rcl_fraction <= 0.0 {
            "Greedy"
        } else {
            "GRASP"
        }
    }
}

/// Wave made of one order and its single-pass greedy cover
pub fn single_order_solution(instance: &WaveInstance, order: usize, algorithm: &str) -> Solution {
    if order >= instance.num_orders() {
        return Solution::from_sets(instance, BTreeSet::new(), BTreeSet::new(), algorithm);
    }
    let aisles = cover_order(instance, order, &BTreeSet::new());
    Solution::from_sets(instance, BTreeSet::from([order]), aisles, algorithm)
}

/// First single-order wave that is feasible once its order is fully
/// covered, scanning orders by index. Falls back to order 0 with its
/// single-pass cover when no order qualifies.
pub fn trivial_solution(instance: &WaveInstance, algorithm: &str) -> Solution {
    for o in 0..instance.num_orders() {
        let units = instance.units(o);
        if units < instance.wave_size_lb || units > instance.wave_size_ub {
            continue;
        }
        if let Some(aisles) = cover_order_fully(instance, o, &BTreeSet::new()) {
            let solution = Solution::from_sets(instance, BTreeSet::from([o]), aisles, algorithm);
            if solution.feasible {
                return solution;
            }
        }
    }
    single_order_solution(instance, 0, algorithm)
}
