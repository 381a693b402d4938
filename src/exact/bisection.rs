//! Continuous bisection on the productivity ratio.
//!
//! `left` starts at the incumbent ratio and `right` at the total requested
//! units (the ratio of every order in a single aisle). Each probe asks the
//! oracle for a wave reaching `mid`: a feasible answer raises `left`, an
//! empty one lowers `right`. Timeouts count as infeasible, so under tight
//! budgets the interval can close below the true optimum.

use super::RatioOracle;
use crate::instance::WaveInstance;
use crate::solution::Solution;
use serde::Serialize;
use std::time::{Duration, Instant};

/// One oracle call of the bisection
#[derive(Debug, Clone, Serialize)]
pub struct Probe {
    /// Ratio asked to the oracle
    pub mid: f64,
    /// Interval after the answer
    pub left: f64,
    pub right: f64,
    /// Whether the oracle returned a wave
    pub feasible: bool,
    /// Wall-clock time of the call in seconds
    pub elapsed: f64,
}

/// Why the bisection stopped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StopReason {
    Deadline,
    SafetyMargin,
    Converged,
    Oracle(String),
}

/// Result of a bisection run
#[derive(Debug, Clone, Serialize)]
pub struct BisectionOutcome {
    /// Best wave found, only when strictly better than the incumbent
    pub best: Option<Solution>,
    pub left: f64,
    pub right: f64,
    pub probes: Vec<Probe>,
    pub stop: StopReason,
}

/// Bisection driver
#[derive(Debug, Clone)]
pub struct RatioBisection {
    /// No probe is started with less than this much time left
    pub safety_margin: Duration,
    /// Stop once `right - left` is below this width
    pub tolerance: f64,
}

impl RatioBisection {
    pub fn new() -> Self {
        RatioBisection {
            safety_margin: Duration::from_secs(1),
            tolerance: 1e-6,
        }
    }

    pub fn with_safety_margin(mut self, safety_margin: Duration) -> Self {
        self.safety_margin = safety_margin;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn run(
        &self,
        instance: &WaveInstance,
        oracle: &dyn RatioOracle,
        incumbent: &Solution,
        deadline: Instant,
    ) -> BisectionOutcome {
        let mut left = if incumbent.feasible { incumbent.objective } else { 0.0 };
        let mut right = instance.total_units() as f64;
        let mut best_ratio = left;
        let mut best: Option<Solution> = None;
        let mut probes = Vec::new();

        let stop = loop {
            let now = Instant::now();
            if now >= deadline {
                break StopReason::Deadline;
            }
            let remaining = deadline - now;
            if remaining <= self.safety_margin {
                break StopReason::SafetyMargin;
            }
            if right - left <= self.tolerance {
                break StopReason::Converged;
            }

            let mid = (left + right) / 2.0;
            let call_start = Instant::now();
            let answer = oracle.solve_feasibility(instance, mid, remaining);
            let elapsed = call_start.elapsed();

            if elapsed > remaining {
                log::warn!(
                    "{} overran its time cap at ratio {:.4}: {:.2}s for {:.2}s",
                    oracle.name(),
                    mid,
                    elapsed.as_secs_f64(),
                    remaining.as_secs_f64()
                );
            }

            let feasible = match answer {
                Ok(Some(candidate)) => {
                    left = mid;
                    if !candidate.feasible {
                        log::warn!("{} returned an infeasible wave at ratio {:.4}", oracle.name(), mid);
                    } else if candidate.objective > best_ratio {
                        log::info!("Bisection improved ratio: {:.4} -> {:.4}", best_ratio, candidate.objective);
                        best_ratio = candidate.objective;
                        best = Some(candidate);
                    }
                    true
                }
                Ok(None) => {
                    right = mid;
                    false
                }
                Err(e) => {
                    log::warn!("Stopping bisection: {}", e);
                    break StopReason::Oracle(e.to_string());
                }
            };

            log::debug!(
                "probe mid={:.4} feasible={} interval=[{:.4}, {:.4}]",
                mid,
                feasible,
                left,
                right
            );
            probes.push(Probe {
                mid,
                left,
                right,
                feasible,
                elapsed: elapsed.as_secs_f64(),
            });
        };

        BisectionOutcome {
            best,
            left,
            right,
            probes,
            stop,
        }
    }
}

impl Default for RatioBisection {
    fn default() -> Self {
        Self::new()
    }
}

impl BisectionOutcome {
    /// Whether the oracle could not be used at all
    pub fn oracle_failed(&self) -> bool {
        matches!(self.stop, StopReason::Oracle(_))
    }
}
