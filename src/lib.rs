//! Wave Picking Solver Library
//!
//! A solver for the wave order-picking problem: choose a set of orders and
//! the warehouse aisles to visit so that every selected order can be picked,
//! the wave size stays within its bounds, and the number of units picked per
//! visited aisle is maximal.
//!
//! # Features
//!
//! - Greedy aisle coverage of single orders
//! - GRASP construction with a restricted candidate list
//! - Local search over add/remove order moves (VND)
//! - Ratio bisection against an exact feasibility oracle (Gurobi MIP)
//! - Random-jump diversification
//! - Time-budgeted orchestration of the three phases
//! - Benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wave_picking_solver::instance::WaveInstance;
//! use wave_picking_solver::exact::NoOracle;
//! use wave_picking_solver::solver::{SolverConfig, WaveSolver};
//!
//! // Load instance
//! let instance = WaveInstance::from_file("instance_0001.txt").unwrap();
//!
//! // Solve for ten seconds without an exact oracle
//! let config = SolverConfig::default().with_time_limit(Duration::from_secs(10));
//! let report = WaveSolver::new(config).solve(&instance, &NoOracle);
//!
//! println!("Units per aisle: {:.2}", report.solution.objective);
//! ```

pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod exact;
pub mod solver;
pub mod benchmark;

pub use instance::WaveInstance;
pub use solution::Solution;
pub use solver::{SolverConfig, WaveSolver};
