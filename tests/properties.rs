mod common;

use common::{best_rebuilt_wave, random_instance, EnumerationOracle, InfeasibleOracle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use wave_picking_solver::exact::{NoOracle, RatioBisection};
use wave_picking_solver::heuristics::*;
use wave_picking_solver::instance::WaveInstance;
use wave_picking_solver::solution::Solution;
use wave_picking_solver::solver::{SolverConfig, WaveSolver};

fn quick_config(seed: u64) -> SolverConfig {
    SolverConfig::default()
        .with_time_limit(Duration::from_millis(20))
        .with_seed(seed)
        .with_safety_margin(Duration::ZERO)
}

fn ratio(units: i64, aisles: usize) -> f64 {
    if aisles == 0 {
        0.0
    } else {
        units as f64 / aisles as f64
    }
}

/// Some single order fits the window and can be fully covered
fn has_single_order_wave(instance: &WaveInstance) -> bool {
    (0..instance.num_orders()).any(|o| {
        let units = instance.units(o);
        units >= instance.wave_size_lb
            && units <= instance.wave_size_ub
            && cover_order_fully(instance, o, &BTreeSet::new()).is_some()
    })
}

#[test]
fn solve_returns_feasible_waves_on_random_catalogs() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    for case in 0..25 {
        let instance = random_instance(&mut rng, &format!("random-{}", case));
        let report = WaveSolver::new(quick_config(case)).solve(&instance, &NoOracle);
        let solution = &report.solution;

        if has_single_order_wave(&instance) {
            assert!(solution.feasible, "case {} returned {:?}", case, solution);
        }
        if solution.feasible {
            assert!(instance.is_feasible(&solution.orders, &solution.aisles));
            assert!(solution.units >= instance.wave_size_lb);
            assert!(solution.units <= instance.wave_size_ub);
            let expected = instance.objective(&solution.orders, &solution.aisles);
            assert!((solution.objective - expected).abs() < 1e-12);
        }
    }
}

#[test]
fn best_ratio_never_decreases_across_phases() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for case in 0..20 {
        let instance = random_instance(&mut rng, &format!("random-{}", case));
        if !has_single_order_wave(&instance) {
            continue;
        }
        let report = WaveSolver::new(quick_config(case)).solve(&instance, &EnumerationOracle);

        assert_eq!(report.phases.len(), 3);
        for pair in report.phases.windows(2) {
            assert!(pair[1].best_ratio_after >= pair[0].best_ratio_after, "case {}", case);
        }
    }
}

#[test]
fn greedy_cover_is_sufficient_when_stock_allows() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for case in 0..40 {
        let instance = random_instance(&mut rng, &format!("random-{}", case));
        let all: BTreeSet<usize> = (0..instance.num_aisles()).collect();

        for o in 0..instance.num_orders() {
            let coverable = is_order_covered(&instance, o, &all);
            match cover_order_fully(&instance, o, &BTreeSet::new()) {
                Some(aisles) => {
                    assert!(coverable);
                    assert!(is_order_covered(&instance, o, &aisles));
                }
                None => assert!(!coverable, "case {} order {} should be coverable", case, o),
            }
        }
    }
}

#[test]
fn vnd_result_is_a_local_optimum() {
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let grasp = GraspConstruction::new();
    let vnd = VND::with_standard_operators();

    for case in 0..30 {
        let instance = random_instance(&mut rng, &format!("random-{}", case));
        let mut solution = grasp.construct(&instance, &mut rng);
        vnd.improve(&instance, &mut solution);

        let current = ratio(solution.units, solution.aisles.len());

        for &o in &solution.orders {
            let units = solution.units - instance.units(o);
            if units < instance.wave_size_lb || units > instance.wave_size_ub {
                continue;
            }
            let mut orders = solution.orders.clone();
            orders.remove(&o);
            let aisles = rebuild_aisles(&instance, &orders);
            assert!(ratio(units, aisles.len()) <= current, "case {}: dropping {} improves", case, o);
        }

        for o in (0..instance.num_orders()).filter(|o| !solution.orders.contains(o)) {
            let units = solution.units + instance.units(o);
            if units > instance.wave_size_ub {
                continue;
            }
            let aisles = extend_aisles(&instance, o, &solution.aisles);
            assert!(ratio(units, aisles.len()) <= current, "case {}: adding {} improves", case, o);
        }
    }
}

#[test]
fn bisection_interval_is_monotone() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let driver = RatioBisection::new()
        .with_safety_margin(Duration::ZERO)
        .with_tolerance(1e-4);

    for case in 0..10 {
        let instance = random_instance(&mut rng, &format!("random-{}", case));
        let incumbent = trivial_solution(&instance, "Trivial");
        let deadline = Instant::now() + Duration::from_secs(10);

        let outcome = driver.run(&instance, &EnumerationOracle, &incumbent, deadline);

        let mut left = if incumbent.feasible { incumbent.objective } else { 0.0 };
        let mut right = instance.total_units() as f64;
        for probe in &outcome.probes {
            assert!(probe.left >= left);
            assert!(probe.right <= right);
            left = probe.left;
            right = probe.right;
        }

        if let (Some(best), Some(reference)) = (outcome.best.as_ref(), best_rebuilt_wave(&instance)) {
            assert!(best.feasible);
            assert!((best.objective - reference.objective).abs() < 1e-12);
        }
    }
}

#[test]
fn infeasible_oracle_leaves_bisection_without_effect() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    for case in 0..10 {
        let instance = random_instance(&mut rng, &format!("random-{}", case));
        let report = WaveSolver::new(quick_config(case)).solve(&instance, &InfeasibleOracle);

        assert_eq!(report.phases[1].improvements, 0);
        assert_eq!(report.phases[1].best_ratio_after, report.phases[0].best_ratio_after);
        let outcome = report.bisection.unwrap();
        assert!(outcome.best.is_none());
        assert!(outcome.probes.iter().all(|p| !p.feasible));
    }
}

#[test]
fn same_seed_gives_same_construction() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let instance = random_instance(&mut rng, "seeded");
    let grasp = GraspConstruction::new();
    let vnd = VND::with_standard_operators();

    let run = |seed: u64| -> Solution {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut solution = grasp.construct(&instance, &mut rng);
        vnd.improve(&instance, &mut solution);
        solution
    };

    let a = run(17);
    let b = run(17);
    assert_eq!(a.orders, b.orders);
    assert_eq!(a.aisles, b.aisles);
}
