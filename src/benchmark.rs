//! Benchmarking and experimentation module for wave picking.
//!
//! Runs the three-phase solver over a set of instances and seeds, collects
//! one row per run, and aggregates them per instance.

use crate::exact::RatioOracle;
use crate::instance::WaveInstance;
use crate::solver::{budget_from_secs, SolverConfig, WaveSolver};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Result of one solver run on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Instance name
    pub instance: String,
    /// Number of orders in the instance
    pub num_orders: usize,
    /// Number of aisles in the instance
    pub num_aisles: usize,
    /// Seed of the run
    pub seed: u64,
    /// Units per visited aisle
    pub objective: f64,
    /// Units picked
    pub units: i64,
    /// Selected orders
    pub orders: usize,
    /// Visited aisles
    pub aisles: usize,
    /// Whether the returned wave is feasible
    pub feasible: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Phase that found the returned wave
    pub best_phase: String,
}

/// Aggregated statistics for an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSummary {
    /// Instance name
    pub instance: String,
    /// Number of runs
    pub num_runs: usize,
    /// Number of feasible runs
    pub num_feasible: usize,
    /// Average objective over feasible runs
    pub avg_objective: f64,
    /// Standard deviation of the objective (0 with fewer than two runs)
    pub std_objective: f64,
    /// Best objective
    pub best_objective: f64,
    /// Worst objective
    pub worst_objective: f64,
    /// Average time
    pub avg_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeds per instance
    pub num_runs: usize,
    /// Time limit per run in seconds
    pub time_limit: f64,
    /// Run the seeds of an instance in parallel
    pub parallel: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
    /// Directory receiving `results.csv`, `statistics.csv` and `report.txt`
    pub output_dir: PathBuf,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            time_limit: 60.0,
            parallel: false,
            show_progress: true,
            output_dir: PathBuf::from("results"),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    /// Solve `instance` once with the given seed
    fn run_once(&self, instance: &WaveInstance, oracle: &(dyn RatioOracle + Sync), seed: u64) -> RunResult {
        let config = SolverConfig::default()
            .with_time_limit(budget_from_secs(self.config.time_limit))
            .with_seed(seed);
        let report = WaveSolver::new(config).solve(instance, oracle);
        let solution = &report.solution;

        RunResult {
            instance: instance.name.clone(),
            num_orders: instance.num_orders(),
            num_aisles: instance.num_aisles(),
            seed,
            objective: solution.objective,
            units: solution.units,
            orders: solution.num_orders(),
            aisles: solution.num_aisles(),
            feasible: solution.feasible,
            time: solution.computation_time,
            best_phase: report.best_phase.to_string(),
        }
    }

    /// Run every seed on an instance
    pub fn run_instance(&mut self, instance: &WaveInstance, oracle: &(dyn RatioOracle + Sync)) {
        log::info!("Running benchmark on instance: {}", instance.name);

        let pb = self.progress_bar(self.config.num_runs);
        pb.set_message(instance.name.clone());

        let seeds: Vec<u64> = (0..self.config.num_runs as u64).collect();
        let mut rows: Vec<RunResult> = if self.config.parallel {
            seeds.par_iter()
                .map(|&seed| {
                    let row = self.run_once(instance, oracle, seed);
                    pb.inc(1);
                    row
                })
                .collect()
        } else {
            seeds.iter()
                .map(|&seed| {
                    let row = self.run_once(instance, oracle, seed);
                    pb.inc(1);
                    row
                })
                .collect()
        };

        pb.finish_with_message(format!("{} done", instance.name));
        self.results.append(&mut rows);
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[WaveInstance], oracle: &(dyn RatioOracle + Sync)) {
        for instance in instances {
            self.run_instance(instance, oracle);
        }
    }

    /// Compute statistics for each instance
    pub fn compute_statistics(&self) -> Vec<InstanceSummary> {
        let mut by_instance: BTreeMap<&str, Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            by_instance.entry(result.instance.as_str())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (instance, runs) in by_instance {
            let feasible: Vec<&RunResult> = runs.iter().copied().filter(|r| r.feasible).collect();
            if feasible.is_empty() {
                statistics.push(InstanceSummary {
                    instance: instance.to_string(),
                    num_runs: runs.len(),
                    num_feasible: 0,
                    avg_objective: 0.0,
                    std_objective: 0.0,
                    best_objective: 0.0,
                    worst_objective: 0.0,
                    avg_time: runs.iter().map(|r| r.time).sum::<f64>() / runs.len() as f64,
                });
                continue;
            }

            let objectives: Vec<f64> = feasible.iter().map(|r| r.objective).collect();
            let times: Vec<f64> = feasible.iter().map(|r| r.time).collect();

            let std_objective = if objectives.len() > 1 {
                objectives.iter().std_dev()
            } else {
                0.0
            };

            statistics.push(InstanceSummary {
                instance: instance.to_string(),
                num_runs: runs.len(),
                num_feasible: feasible.len(),
                avg_objective: objectives.iter().mean(),
                std_objective,
                best_objective: objectives.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                worst_objective: objectives.iter().cloned().fold(f64::INFINITY, f64::min),
                avg_time: times.iter().mean(),
            });
        }

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let file = File::create(path.as_ref())
            .map_err(|e| format!("Failed to create {:?}: {}", path.as_ref(), e))?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)
                .map_err(|e| format!("Failed to write result row: {}", e))?;
        }

        writer.flush()
            .map_err(|e| format!("Failed to flush {:?}: {}", path.as_ref(), e))
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let file = File::create(path.as_ref())
            .map_err(|e| format!("Failed to create {:?}: {}", path.as_ref(), e))?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)
                .map_err(|e| format!("Failed to write statistics row: {}", e))?;
        }

        writer.flush()
            .map_err(|e| format!("Failed to flush {:?}: {}", path.as_ref(), e))
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      Wave Picking Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        report.push_str(&format!(
            "Runs per instance: {}, time limit: {:.1}s\n\n",
            self.config.num_runs, self.config.time_limit
        ));

        report.push_str("Instance Summary:\n");
        report.push_str("-".repeat(88).as_str());
        report.push('\n');
        report.push_str(&format!("{:<25} {:>10} {:>12} {:>10} {:>12} {:>12}\n",
            "Instance", "Feasible", "Avg Ratio", "Std", "Best Ratio", "Avg Time"));
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!("{:<25} {:>10} {:>12.4} {:>10.4} {:>12.4} {:>12.3}\n",
                stat.instance,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.avg_objective,
                stat.std_objective,
                stat.best_objective,
                stat.avg_time));
        }

        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        let mut phase_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for result in self.results.iter().filter(|r| r.feasible) {
            *phase_counts.entry(result.best_phase.as_str()).or_insert(0) += 1;
        }
        if !phase_counts.is_empty() {
            report.push_str("\nBest wave found in:\n");
            for (phase, count) in phase_counts {
                report.push_str(&format!("  {}: {} runs\n", phase, count));
            }
        }

        report
    }

    /// Write the run rows, the per-instance statistics and the report
    /// into the configured output directory. Returns the report text.
    pub fn save(&self) -> Result<String, String> {
        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create output directory {:?}: {}", dir, e))?;

        self.export_to_csv(dir.join("results.csv"))?;
        self.export_statistics_csv(dir.join("statistics.csv"))?;

        let report = self.generate_report();
        let report_path = dir.join("report.txt");
        std::fs::write(&report_path, &report)
            .map_err(|e| format!("Failed to write {:?}: {}", report_path, e))?;

        log::info!("Benchmark results saved to {:?}", dir);
        Ok(report)
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<WaveInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "txt").unwrap_or(false) {
                match WaveInstance::from_file(&path) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by size, then name for a stable order
    instances.sort_by(|a, b| {
        a.num_orders().cmp(&b.num_orders()).then_with(|| a.name.cmp(&b.name))
    });

    instances
}
