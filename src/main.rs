//! Wave Picking Solver - Command Line Interface
//!
//! Selects a wave of orders and the aisles to visit, maximizing units
//! picked per visited aisle.

use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wave_picking_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use wave_picking_solver::exact::{GurobiOracle, NoOracle, OracleConfig, RatioOracle};
use wave_picking_solver::heuristics::{ConstructionHeuristic, GraspConstruction, LocalSearch, VND};
use wave_picking_solver::instance::WaveInstance;
use wave_picking_solver::solution::Solution;
use wave_picking_solver::solver::{budget_from_secs, SolverConfig, WaveSolver};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "wave-picking-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A time-budgeted solver for wave order picking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Time limit in seconds
        #[arg(short, long, default_value = "585")]
        time_limit: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Exact oracle used by the bisection phase
        #[arg(long, value_enum, default_value = "gurobi")]
        oracle: OracleKind,

        /// Oracle threads (0 = automatic)
        #[arg(long, default_value = "0")]
        threads: i32,

        /// Output solution to file (challenge layout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dump the full solve report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of seeds per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Time limit per run
        #[arg(short, long, default_value = "60")]
        time_limit: f64,

        /// Exact oracle used by the bisection phase
        #[arg(long, value_enum, default_value = "none")]
        oracle: OracleKind,

        /// Run the seeds of an instance in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Check a solution file against an instance
    Check {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Path to the solution file
        #[arg(short = 'S', long)]
        solution: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum OracleKind {
    /// Gurobi MIP (needs the `gurobi` feature)
    Gurobi,
    /// No exact oracle, bisection is skipped
    None,
}

fn build_oracle(kind: OracleKind, threads: i32, verbose: bool) -> Box<dyn RatioOracle + Sync> {
    match kind {
        OracleKind::Gurobi => Box::new(GurobiOracle::new(OracleConfig {
            threads,
            verbose,
            ..Default::default()
        })),
        OracleKind::None => Box::new(NoOracle),
    }
}

fn load_instance(path: &Path) -> WaveInstance {
    match WaveInstance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { instance, time_limit, seed, oracle, threads, output, json, verbose } => {
            solve_instance(&instance, time_limit, seed, oracle, threads, output, json, verbose);
        }

        Commands::Benchmark { dir, output, runs, time_limit, oracle, parallel } => {
            run_benchmark(&dir, &output, runs, time_limit, oracle, parallel);
        }

        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }

        Commands::Check { instance, solution } => {
            check_solution(&instance, &solution);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_instance(
    path: &Path,
    time_limit: f64,
    seed: u64,
    oracle: OracleKind,
    threads: i32,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);
    let instance = load_instance(path);

    if verbose {
        println!("{}", instance.statistics());
    }

    let config = SolverConfig::default()
        .with_time_limit(budget_from_secs(time_limit))
        .with_seed(seed);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let oracle = build_oracle(oracle, threads, verbose);
    println!("Solving with {:.1}s budget (oracle: {})...", time_limit, oracle.name());

    let report = WaveSolver::new(config).solve(&instance, oracle.as_ref());
    let solution = &report.solution;

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Objective (units/aisle): {:.4}", solution.objective);
    println!("Units: {}", solution.units);
    println!("Orders: {}", solution.num_orders());
    println!("Aisles: {}", solution.num_aisles());
    println!("Feasible: {}", solution.feasible);
    println!("Found in: {} phase", report.best_phase);
    println!("Time: {:.4}s", solution.computation_time);

    if verbose {
        println!("\nPhases:");
        for phase in &report.phases {
            println!("  {:<16} ratio {:>10.4}  iterations {:>8}  improvements {:>4}  {:.2}s",
                phase.phase.to_string(),
                phase.best_ratio_after,
                phase.iterations,
                phase.improvements,
                phase.elapsed);
        }
        println!("\nOrders: {:?}", solution.orders);
        println!("Aisles: {:?}", solution.aisles);
    }

    if let Some(out_path) = output {
        if let Err(e) = solution.write_to(&out_path) {
            eprintln!("Failed to write solution: {}", e);
            std::process::exit(1);
        }
        println!("\nSolution saved to {:?}", out_path);
    }

    if let Some(json_path) = json {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to serialize report: {}", e))
            .and_then(|text| {
                std::fs::write(&json_path, text).map_err(|e| format!("Failed to write {:?}: {}", json_path, e))
            });
        match written {
            Ok(()) => println!("Report saved to {:?}", json_path),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    time_limit: f64,
    oracle: OracleKind,
    parallel: bool,
) {
    println!("Loading instances from {:?}...", dir);

    let instances = load_instances_from_dir(dir);

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    let config = BenchmarkConfig {
        num_runs: runs,
        time_limit,
        parallel,
        output_dir: output.to_path_buf(),
        ..Default::default()
    };

    let oracle = build_oracle(oracle, 0, false);
    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!("\n[{}/{}] Processing {} ({} orders, {} aisles)...",
            i + 1, instances.len(), instance.name, instance.num_orders(), instance.num_aisles());

        benchmark.run_instance(instance, oracle.as_ref());
    }

    match benchmark.save() {
        Ok(report) => {
            println!("\n{}", report);
            println!("Results, statistics and report saved to {:?}", output);
        }
        Err(e) => {
            eprintln!("Failed to export results: {}", e);
            std::process::exit(1);
        }
    }
}

fn analyze_instance(path: &Path) {
    let instance = load_instance(path);

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let greedy = GraspConstruction::greedy().construct(&instance, &mut rng);

    let mut grasp = GraspConstruction::new().construct(&instance, &mut rng);
    let vnd = VND::with_standard_operators();
    vnd.improve(&instance, &mut grasp);

    println!("Quick Solution Estimates:");
    println!("  Greedy: {:.4} (feasible: {})", greedy.objective, greedy.feasible);
    println!("  GRASP + VND: {:.4} (feasible: {}, {} orders, {} aisles)",
        grasp.objective, grasp.feasible, grasp.num_orders(), grasp.num_aisles());
}

fn check_solution(instance_path: &Path, solution_path: &Path) {
    let instance = load_instance(instance_path);

    let solution = match Solution::from_file(&instance, solution_path) {
        Ok(sol) => sol,
        Err(e) => {
            eprintln!("Error loading solution: {}", e);
            std::process::exit(1);
        }
    };

    let report = instance.check_feasibility_detailed(&solution.orders, &solution.aisles);
    println!("{}", report);

    if !report.feasible {
        std::process::exit(1);
    }
}
