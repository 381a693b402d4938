mod common;

use common::{split_instance, tiny_instance, EnumerationOracle, InfeasibleOracle};
use std::collections::BTreeSet;
use std::time::Duration;
use wave_picking_solver::exact::{GurobiOracle, NoOracle, OracleConfig};
use wave_picking_solver::instance::WaveInstance;
use wave_picking_solver::solution::Solution;
use wave_picking_solver::solver::{Phase, SolverConfig, WaveSolver};

fn quick_config() -> SolverConfig {
    SolverConfig::default()
        .with_time_limit(Duration::from_millis(30))
        .with_safety_margin(Duration::ZERO)
}

#[test]
fn tiny_instance_uses_a_single_aisle() {
    let instance = tiny_instance();
    let report = WaveSolver::new(quick_config()).solve(&instance, &NoOracle);
    let solution = report.solution;

    assert!(solution.feasible);
    assert!(solution.orders.contains(&0));
    assert_eq!(solution.aisles, BTreeSet::from([0]));
    assert!(solution.objective >= 5.0);

    // any wave visiting both aisles is worse
    let both = Solution::from_sets(&instance, BTreeSet::from([0, 1]), BTreeSet::from([0, 1]), "both");
    assert!(solution.objective > both.objective);
}

#[test]
fn unreachable_lower_bound_returns_flagged_wave() {
    let mut instance = tiny_instance();
    instance.wave_size_lb = instance.total_units() + 1;
    instance.wave_size_ub = instance.wave_size_lb + 10;

    let report = WaveSolver::new(quick_config()).solve(&instance, &EnumerationOracle);

    assert!(!report.solution.feasible);
    assert_eq!(report.solution.orders.len(), 1);
    let check = instance.check_feasibility_detailed(&report.solution.orders, &report.solution.aisles);
    assert!(!check.violations.is_empty());
}

#[test]
fn always_infeasible_oracle_keeps_construction_result() {
    let instance = split_instance();
    let report = WaveSolver::new(quick_config()).solve(&instance, &InfeasibleOracle);

    let outcome = report.bisection.as_ref().unwrap();
    assert!(!outcome.probes.is_empty());
    assert!(outcome.probes.iter().all(|p| !p.feasible));
    assert!(outcome.right < instance.total_units() as f64);

    assert!(report.solution.feasible);
    assert_eq!(report.best_phase, Phase::Construction);
    assert!((report.solution.objective - report.phases[0].best_ratio_after).abs() < 1e-12);
}

#[test]
fn missing_gurobi_falls_back_to_heuristics() {
    let instance = split_instance();
    let oracle = GurobiOracle::new(OracleConfig::default());
    let report = WaveSolver::new(quick_config()).solve(&instance, &oracle);

    assert!(report.solution.feasible);
    assert!((report.solution.objective - 3.0).abs() < 1e-12);
    if cfg!(not(feature = "gurobi")) {
        assert!(report.bisection.as_ref().unwrap().oracle_failed());
        assert_eq!(report.phases[1].iterations, 0);
    }
}

#[test]
fn closed_interval_skips_the_oracle() {
    // tiny reaches 6 units on one aisle, the total of the catalog
    let instance = tiny_instance();
    let report = WaveSolver::new(quick_config()).solve(&instance, &NoOracle);

    let outcome = report.bisection.unwrap();
    assert!(!outcome.oracle_failed());
    assert!(outcome.probes.is_empty());
    assert!((report.solution.objective - 6.0).abs() < 1e-12);
}

#[test]
fn solution_file_round_trip() {
    let instance = tiny_instance();
    let report = WaveSolver::new(quick_config()).solve(&instance, &NoOracle);

    let path = std::env::temp_dir().join(format!("wave-solution-{}.txt", std::process::id()));
    report.solution.write_to(&path).unwrap();
    let loaded = Solution::from_file(&instance, &path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.orders, report.solution.orders);
    assert_eq!(loaded.aisles, report.solution.aisles);
    assert!(loaded.feasible);
}

#[test]
fn instance_file_is_parsed_with_its_stem_as_name() {
    let path = std::env::temp_dir().join(format!("instance_{}.txt", std::process::id()));
    std::fs::write(&path, "2 2 2\n2 0 3 1 2\n1 0 1\n2 0 4 1 2\n1 0 1\n1 10\n").unwrap();
    let instance = WaveInstance::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(instance.name, format!("instance_{}", std::process::id()));
    assert_eq!(instance.num_orders(), 2);
}
