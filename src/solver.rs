//! Time-budgeted orchestration of the three search phases.
//!
//! 1. GRASP construction followed by VND, repeated until the construction
//!    share of the budget is spent.
//! 2. Ratio bisection against an exact oracle.
//! 3. Random jumps around the best wave until the overall deadline.
//!
//! A single best wave is carried across phases and only replaced by a
//! feasible wave with a strictly higher ratio.

use crate::exact::{BisectionOutcome, RatioBisection, RatioOracle};
use crate::heuristics::{
    trivial_solution, ConstructionHeuristic, GraspConstruction, LocalSearch, RandomJump, VND,
};
use crate::instance::WaveInstance;
use crate::solution::Solution;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Longest budget the solver accepts, larger ones are cut down to it
pub const MAX_TIME_LIMIT: Duration = Duration::from_secs(365 * 24 * 3600);

/// Budget given in seconds, saturating to `[0, MAX_TIME_LIMIT]`
pub fn budget_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else if secs >= MAX_TIME_LIMIT.as_secs_f64() {
        MAX_TIME_LIMIT
    } else {
        Duration::from_secs_f64(secs)
    }
}

/// Solver configuration
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Overall wall-clock budget
    pub time_limit: Duration,
    /// Share of the budget spent in GRASP + VND
    pub construction_share: f64,
    /// Share of the budget spent in the ratio bisection
    pub bisection_share: f64,
    /// Seed of the random stream shared by every phase
    pub seed: u64,
    /// RCL share used by GRASP
    pub rcl_fraction: f64,
    /// Time kept free before the bisection deadline
    pub safety_margin: Duration,
    /// Width below which the bisection interval counts as closed
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: Duration::from_secs(585),
            construction_share: 0.15,
            bisection_share: 0.60,
            seed: 42,
            rcl_fraction: 0.3,
            safety_margin: Duration::from_secs(1),
            tolerance: 1e-6,
        }
    }
}

impl SolverConfig {
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shares(mut self, construction_share: f64, bisection_share: f64) -> Self {
        self.construction_share = construction_share;
        self.bisection_share = bisection_share;
        self
    }

    pub fn with_rcl_fraction(mut self, rcl_fraction: f64) -> Self {
        self.rcl_fraction = rcl_fraction;
        self
    }

    pub fn with_safety_margin(mut self, safety_margin: Duration) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    /// Check that shares and fractions are usable
    pub fn validate(&self) -> Result<(), String> {
        let in_unit = |x: f64| (0.0..=1.0).contains(&x);
        if !in_unit(self.construction_share) || !in_unit(self.bisection_share) {
            return Err(format!(
                "Phase shares must lie in [0, 1], got {} and {}",
                self.construction_share, self.bisection_share
            ));
        }
        if self.construction_share + self.bisection_share > 1.0 {
            return Err(format!(
                "Phase shares sum to {} > 1",
                self.construction_share + self.bisection_share
            ));
        }
        if !in_unit(self.rcl_fraction) {
            return Err(format!("RCL fraction must lie in [0, 1], got {}", self.rcl_fraction));
        }
        Ok(())
    }

    /// Copy with every value brought back into a usable range. Non-finite
    /// values fall back to the defaults and the shares sum to at most 1.
    pub fn sanitized(&self) -> SolverConfig {
        let defaults = SolverConfig::default();
        let unit = |x: f64, fallback: f64| if x.is_finite() { x.clamp(0.0, 1.0) } else { fallback };
        let construction_share = unit(self.construction_share, defaults.construction_share);
        let bisection_share = unit(self.bisection_share, defaults.bisection_share).min(1.0 - construction_share);

        SolverConfig {
            time_limit: self.time_limit.min(MAX_TIME_LIMIT),
            construction_share,
            bisection_share,
            seed: self.seed,
            rcl_fraction: unit(self.rcl_fraction, defaults.rcl_fraction),
            safety_margin: self.safety_margin.min(MAX_TIME_LIMIT),
            tolerance: if self.tolerance.is_finite() && self.tolerance > 0.0 {
                self.tolerance
            } else {
                defaults.tolerance
            },
        }
    }
}

/// Search phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Construction,
    Bisection,
    Diversification,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Phase::Construction => "construction",
            Phase::Bisection => "bisection",
            Phase::Diversification => "diversification",
        };
        write!(f, "{}", name)
    }
}

/// What happened in one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    /// Best ratio known when the phase ended
    pub best_ratio_after: f64,
    /// GRASP starts, oracle probes or random jumps
    pub iterations: usize,
    /// Times the best wave was replaced
    pub improvements: usize,
    /// Phase duration in seconds
    pub elapsed: f64,
}

/// Result of [`WaveSolver::solve`]
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub solution: Solution,
    pub phases: Vec<PhaseSummary>,
    pub bisection: Option<BisectionOutcome>,
    /// Phase that produced the returned wave
    pub best_phase: Phase,
}

/// Whether `candidate` should replace `best`
fn improves(candidate: &Solution, best: &Solution) -> bool {
    candidate.feasible && (!best.feasible || candidate.objective > best.objective)
}

/// Three-phase wave solver
pub struct WaveSolver {
    config: SolverConfig,
}

impl WaveSolver {
    pub fn new(config: SolverConfig) -> Self {
        WaveSolver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the three phases and return the best wave found.
    ///
    /// Never fails: an unusable oracle only skips the bisection phase, and
    /// its time goes to diversification.
    pub fn solve(&self, instance: &WaveInstance, oracle: &dyn RatioOracle) -> SolveReport {
        if let Err(e) = self.config.validate() {
            log::warn!("{}, clamping the configuration", e);
        }
        let config = self.config.sanitized();

        let start = Instant::now();
        let final_deadline = start + config.time_limit;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut phases = Vec::with_capacity(3);

        log::info!(
            "Solving {} ({} orders, {} aisles, wave in [{}, {}]) within {:.1}s",
            instance.name,
            instance.num_orders(),
            instance.num_aisles(),
            instance.wave_size_lb,
            instance.wave_size_ub,
            config.time_limit.as_secs_f64()
        );

        // Phase 1: GRASP + VND
        let phase_start = Instant::now();
        let construction_budget = config.time_limit.mul_f64(config.construction_share);
        let construction_deadline = (start + construction_budget).min(final_deadline);
        let grasp = GraspConstruction::with_rcl_fraction(config.rcl_fraction);
        let vnd = VND::with_standard_operators();
        let mut best: Option<Solution> = None;
        let mut iterations = 0;
        let mut improvements = 0;

        loop {
            iterations += 1;
            let mut candidate = grasp.construct(instance, &mut rng);
            vnd.improve(instance, &mut candidate);
            candidate.algorithm = format!("{}+{}", grasp.name(), vnd.name());

            if best.as_ref().map_or(candidate.feasible, |b| improves(&candidate, b)) {
                log::info!("Construction iteration {}: ratio {:.4}", iterations, candidate.objective);
                improvements += 1;
                best = Some(candidate);
            }

            if Instant::now() >= construction_deadline {
                break;
            }
        }

        let mut best = match best {
            Some(solution) => solution,
            None => {
                log::warn!("No feasible wave after {} constructions, using a single order", iterations);
                trivial_solution(instance, "Trivial")
            }
        };
        let mut best_phase = Phase::Construction;

        phases.push(PhaseSummary {
            phase: Phase::Construction,
            best_ratio_after: best.objective,
            iterations,
            improvements,
            elapsed: phase_start.elapsed().as_secs_f64(),
        });

        // Phase 2: ratio bisection
        let phase_start = Instant::now();
        let bisection_budget = config.time_limit.mul_f64(config.bisection_share);
        let bisection_deadline = (phase_start + bisection_budget).min(final_deadline);
        let driver = RatioBisection::new()
            .with_safety_margin(config.safety_margin)
            .with_tolerance(config.tolerance);
        let outcome = driver.run(instance, oracle, &best, bisection_deadline);

        let mut improvements = 0;
        if let Some(candidate) = outcome.best.as_ref() {
            if improves(candidate, &best) {
                best = candidate.clone();
                best_phase = Phase::Bisection;
                improvements = 1;
            }
        }
        if outcome.oracle_failed() {
            log::warn!("Bisection skipped with {} oracle, remaining time goes to random jumps", oracle.name());
        }
        log::info!(
            "Bisection finished after {} probes ({:?}): interval [{:.4}, {:.4}], best {:.4}",
            outcome.probes.len(),
            outcome.stop,
            outcome.left,
            outcome.right,
            best.objective
        );

        phases.push(PhaseSummary {
            phase: Phase::Bisection,
            best_ratio_after: best.objective,
            iterations: outcome.probes.len(),
            improvements,
            elapsed: phase_start.elapsed().as_secs_f64(),
        });

        // Phase 3: random jumps around the best wave
        let phase_start = Instant::now();
        let jump = RandomJump::new();
        let mut iterations = 0;
        let mut improvements = 0;

        while Instant::now() < final_deadline {
            iterations += 1;
            if let Some(candidate) = jump.perturb(instance, &best, &mut rng) {
                if improves(&candidate, &best) {
                    log::info!("Random jump {}: ratio {:.4} -> {:.4}", iterations, best.objective, candidate.objective);
                    best = candidate;
                    best_phase = Phase::Diversification;
                    improvements += 1;
                }
            }
        }

        phases.push(PhaseSummary {
            phase: Phase::Diversification,
            best_ratio_after: best.objective,
            iterations,
            improvements,
            elapsed: phase_start.elapsed().as_secs_f64(),
        });

        best.computation_time = start.elapsed().as_secs_f64();
        log::info!(
            "Best wave: {} orders, {} aisles, ratio {:.4} (found in {} phase)",
            best.num_orders(),
            best.num_aisles(),
            best.objective,
            best_phase
        );

        SolveReport {
            solution: best,
            phases,
            bisection: Some(outcome),
            best_phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::{NoOracle, OracleError};
    use crate::instance::ItemMap;
    use std::collections::BTreeSet;

    fn create_test_instance() -> WaveInstance {
        WaveInstance::new(
            "tiny",
            vec![
                ItemMap::from([(0, 3), (1, 2)]),
                ItemMap::from([(0, 1)]),
            ],
            vec![
                ItemMap::from([(0, 4), (1, 2)]),
                ItemMap::from([(0, 1)]),
            ],
            2,
            1,
            10,
        )
        .unwrap()
    }

    /// Two orders that each need their own aisle: every wave has ratio 3,
    /// below the 6 total units, so the bisection interval starts open
    fn create_split_instance() -> WaveInstance {
        WaveInstance::new(
            "split",
            vec![
                ItemMap::from([(0, 3)]),
                ItemMap::from([(1, 3)]),
            ],
            vec![
                ItemMap::from([(0, 5)]),
                ItemMap::from([(1, 5)]),
            ],
            2,
            1,
            10,
        )
        .unwrap()
    }

    fn quick_config(seed: u64) -> SolverConfig {
        SolverConfig::default()
            .with_time_limit(Duration::from_millis(60))
            .with_seed(seed)
            .with_safety_margin(Duration::ZERO)
    }

    struct Infeasible;

    impl RatioOracle for Infeasible {
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

    #[test]
    fn test_config_validation() {
        assert!(SolverConfig::default().validate().is_ok());
        assert!(SolverConfig::default().with_shares(0.5, 0.6).validate().is_err());
        assert!(SolverConfig::default().with_shares(-0.1, 0.6).validate().is_err());
        assert!(SolverConfig::default().with_rcl_fraction(1.5).validate().is_err());
        assert!(SolverConfig::default().with_shares(0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn test_tiny_instance() {
        let instance = create_test_instance();
        let report = WaveSolver::new(quick_config(1)).solve(&instance, &NoOracle);

        let solution = &report.solution;
        assert!(solution.feasible);
        assert!(solution.orders.contains(&0));
        assert_eq!(solution.aisles, BTreeSet::from([0]));
        // aisle 0 alone stocks both orders: 6 units, one aisle
        assert_eq!(solution.orders, BTreeSet::from([0, 1]));
        assert!((solution.objective - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_phases_are_monotone() {
        let instance = create_test_instance();
        let report = WaveSolver::new(quick_config(3)).solve(&instance, &NoOracle);

        assert_eq!(report.phases.len(), 3);
        for pair in report.phases.windows(2) {
            assert!(pair[1].best_ratio_after >= pair[0].best_ratio_after);
        }
        assert_eq!(report.phases[2].best_ratio_after, report.solution.objective);
    }

    #[test]
    fn test_unavailable_oracle_skips_bisection() {
        let instance = create_split_instance();
        let report = WaveSolver::new(quick_config(0)).solve(&instance, &NoOracle);

        let outcome = report.bisection.unwrap();
        assert!(outcome.oracle_failed());
        assert!(outcome.probes.is_empty());
        assert_eq!(report.phases[1].iterations, 0);
        assert!(report.solution.feasible);
        assert!((report.solution.objective - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_infeasible_oracle_keeps_construction_result() {
        let instance = create_split_instance();
        let report = WaveSolver::new(quick_config(5)).solve(&instance, &Infeasible);

        let outcome = report.bisection.as_ref().unwrap();
        assert!(!outcome.probes.is_empty());
        assert!(outcome.probes.iter().all(|p| !p.feasible));
        assert!(outcome.right < instance.total_units() as f64);
        assert!(outcome.best.is_none());

        assert_eq!(report.phases[1].improvements, 0);
        assert_eq!(report.phases[1].best_ratio_after, report.phases[0].best_ratio_after);
        assert_eq!(report.best_phase, Phase::Construction);
        assert!(report.solution.feasible);
    }

    #[test]
    fn test_sanitized_config() {
        let config = SolverConfig::default()
            .with_time_limit(Duration::MAX)
            .with_shares(f64::NAN, 2.0)
            .with_rcl_fraction(f64::INFINITY)
            .sanitized();

        assert_eq!(config.time_limit, MAX_TIME_LIMIT);
        assert_eq!(config.construction_share, 0.15);
        assert!((config.bisection_share - 0.85).abs() < 1e-12);
        assert_eq!(config.rcl_fraction, 0.3);

        let defaults = SolverConfig::default();
        let kept = defaults.sanitized();
        assert_eq!(kept.construction_share, defaults.construction_share);
        assert_eq!(kept.bisection_share, defaults.bisection_share);
    }

    #[test]
    fn test_budget_from_secs_saturates() {
        assert_eq!(budget_from_secs(f64::INFINITY), MAX_TIME_LIMIT);
        assert_eq!(budget_from_secs(1e30), MAX_TIME_LIMIT);
        assert_eq!(budget_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(budget_from_secs(-3.0), Duration::ZERO);
        assert_eq!(budget_from_secs(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_invalid_config_does_not_panic() {
        let instance = create_test_instance();
        let config = quick_config(4).with_shares(f64::NAN, f64::NAN).with_rcl_fraction(-1.0);
        let report = WaveSolver::new(config).solve(&instance, &NoOracle);

        assert_eq!(report.phases.len(), 3);
        assert!(report.solution.feasible);
    }

    #[test]
    fn test_unreachable_lower_bound_does_not_crash() {
        let mut instance = create_test_instance();
        instance.wave_size_lb = 7;
        instance.wave_size_ub = 20;

        let report = WaveSolver::new(quick_config(2)).solve(&instance, &NoOracle);
        assert!(!report.solution.feasible);
        assert_eq!(report.solution.orders.len(), 1);
    }
}
