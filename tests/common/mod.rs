//! Shared helpers for the integration tests.

#![allow(dead_code)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use std::time::Duration;
use wave_picking_solver::exact::{OracleError, RatioOracle};
use wave_picking_solver::heuristics::rebuild_aisles;
use wave_picking_solver::instance::{ItemMap, WaveInstance};
use wave_picking_solver::solution::Solution;

/// Small random catalog: 2..=8 orders, 2..=6 aisles, 2..=5 items.
pub fn random_instance(rng: &mut ChaCha8Rng, name: &str) -> WaveInstance {
    let num_items = rng.gen_range(2..=5);
    let num_orders = rng.gen_range(2..=8);
    let num_aisles = rng.gen_range(2..=6);

    let orders: Vec<ItemMap> = (0..num_orders)
        .map(|_| {
            let mut order = ItemMap::new();
            for _ in 0..rng.gen_range(1..=3) {
                let item = rng.gen_range(0..num_items);
                let qty = rng.gen_range(1..=4);
                *order.entry(item).or_insert(0) += qty;
            }
            order
        })
        .collect();

    let mut aisles: Vec<ItemMap> = Vec::with_capacity(num_aisles);
    for _ in 0..num_aisles {
        let mut aisle = ItemMap::new();
        for item in 0..num_items {
            if rng.gen_bool(0.5) {
                aisle.insert(item, rng.gen_range(1..=8));
            }
        }
        aisles.push(aisle);
    }

    let total: i64 = orders.iter().flat_map(|o| o.values()).sum();
    let lb = rng.gen_range(1..=(total / 4).max(1));
    let ub = rng.gen_range(lb..=total);

    WaveInstance::new(name, orders, aisles, num_items, lb, ub).unwrap()
}

/// The tiny two-order catalog used by several scenarios
pub fn tiny_instance() -> WaveInstance {
    WaveInstance::from_str("tiny", "2 2 2\n2 0 3 1 2\n1 0 1\n2 0 4 1 2\n1 0 1\n1 10\n").unwrap()
}

/// Two orders that each need their own aisle. Every wave has ratio 3,
/// strictly below the 6 total units, so the bisection has work to do.
pub fn split_instance() -> WaveInstance {
    WaveInstance::from_str("split", "2 2 2\n1 0 3\n1 1 3\n1 0 5\n1 1 5\n1 10\n").unwrap()
}

/// Best feasible wave among all order subsets, each covered by the greedy
/// aisle rebuild.
pub fn best_rebuilt_wave(instance: &WaveInstance) -> Option<Solution> {
    let n = instance.num_orders();
    let mut best: Option<Solution> = None;

    for mask in 1u32..(1 << n) {
        let orders: BTreeSet<usize> = (0..n).filter(|o| mask & (1 << o) != 0).collect();
        let aisles = rebuild_aisles(instance, &orders);
        let candidate = Solution::from_sets(instance, orders, aisles, "Enumeration");
        if candidate.feasible && best.as_ref().map_or(true, |b| candidate.objective > b.objective) {
            best = Some(candidate);
        }
    }

    best
}

/// Answers by enumeration over the rebuilt waves of a small instance
pub struct EnumerationOracle;

impl RatioOracle for EnumerationOracle {
    fn solve_feasibility(
        &self,
        instance: &WaveInstance,
        ratio: f64,
        _time_cap: Duration,
    ) -> Result<Option<Solution>, OracleError> {
        Ok(best_rebuilt_wave(instance).filter(|s| s.objective >= ratio))
    }

    fn name(&self) -> &str {
        "Enumeration"
    }
}

/// Never finds a wave
pub struct InfeasibleOracle;

impl RatioOracle for InfeasibleOracle {
    fn solve_feasibility(
        &self,
        _instance: &WaveInstance,
        _ratio: f64,
        _time_cap: Duration,
    ) -> Result<Option<Solution>, OracleError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        "Infeasible"
    }
}
