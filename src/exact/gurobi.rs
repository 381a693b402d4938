//! Ratio feasibility oracle using Gurobi.
//!
//! For a fixed ratio `r` the model is a pure feasibility MIP:
//! - Binary variables x[o] for selected orders
//! - Binary variables y[a] for visited aisles
//! - Wave window on the selected units
//! - At most `MAX_AISLES` visited aisles
//! - Per-item coverage: demand of selected orders <= supply of visited aisles
//! - Productivity cut: sum(units[o] * x[o]) - r * sum(y[a]) >= 0
//!
//! The objective is constant, so the solver stops at the first incumbent.

use super::{OracleConfig, OracleError, RatioOracle};
use crate::instance::{WaveInstance, MAX_AISLES};
use crate::solution::Solution;
use grb::prelude::*;
use std::collections::BTreeSet;
use std::time::Duration;

/// Gurobi-based ratio oracle
pub struct GurobiOracle {
    pub config: OracleConfig,
}

impl GurobiOracle {
    pub fn new(config: OracleConfig) -> Self {
        GurobiOracle { config }
    }

    fn build_and_solve(
        &self,
        instance: &WaveInstance,
        ratio: f64,
        time_cap: Duration,
    ) -> Result<Option<Solution>, OracleError> {
        let start = std::time::Instant::now();
        let n = instance.num_orders();
        let m = instance.num_aisles();
        let failed = |what: &str, e: grb::Error| OracleError::Failed(format!("{}: {}", what, e));

        let env = Env::new("")
            .map_err(|e| OracleError::Unavailable(format!("Failed to create Gurobi environment: {}", e)))?;

        let mut model = Model::with_env("wave", env)
            .map_err(|e| failed("Failed to create model", e))?;

        model.set_param(param::TimeLimit, time_cap.as_secs_f64().max(0.0))
            .map_err(|e| failed("Failed to set time limit", e))?;
        model.set_param(param::Threads, self.config.threads)
            .map_err(|e| failed("Failed to set threads", e))?;
        model.set_param(param::SolutionLimit, 1)
            .map_err(|e| failed("Failed to set solution limit", e))?;

        if !self.config.verbose {
            model.set_param(param::OutputFlag, 0)
                .map_err(|e| failed("Failed to set output flag", e))?;
        }

        // x[o] = 1 if order o is in the wave
        let mut x: Vec<Var> = Vec::with_capacity(n);
        for o in 0..n {
            let var = add_binvar!(model, name: &format!("x_{}", o))
                .map_err(|e| failed(&format!("Failed to add variable x[{}]", o), e))?;
            x.push(var);
        }

        // y[a] = 1 if aisle a is visited
        let mut y: Vec<Var> = Vec::with_capacity(m);
        for a in 0..m {
            let var = add_binvar!(model, name: &format!("y_{}", a))
                .map_err(|e| failed(&format!("Failed to add variable y[{}]", a), e))?;
            y.push(var);
        }

        model.update()
            .map_err(|e| failed("Failed to update model", e))?;

        // Wave window
        let wave_units: Expr = (0..n)
            .map(|o| instance.units(o) as f64 * x[o])
            .grb_sum();
        model.add_constr("wave_lb", c!(wave_units.clone() >= instance.wave_size_lb as f64))
            .map_err(|e| failed("Failed to add wave lower bound", e))?;
        model.add_constr("wave_ub", c!(wave_units <= instance.wave_size_ub as f64))
            .map_err(|e| failed("Failed to add wave upper bound", e))?;

        // Aisle cap
        let visited: Expr = y.iter().copied().grb_sum();
        model.add_constr("aisle_cap", c!(visited <= MAX_AISLES as f64))
            .map_err(|e| failed("Failed to add aisle cap", e))?;

        // Cardinality cut on large instances
        if n > self.config.large_instance_orders {
            let bound = ((n - 1) as f64)
                .min((instance.wave_size_ub + instance.wave_size_lb) as f64 / 2.0 + m as f64 / 4.0);
            let selected: Expr = x.iter().copied().grb_sum();
            model.add_constr("order_cap", c!(selected <= bound))
                .map_err(|e| failed("Failed to add order cardinality cut", e))?;
        }

        // Coverage per item
        let mut demand_lines: Vec<Vec<(usize, i64)>> = vec![Vec::new(); instance.num_items];
        for (o, order) in instance.orders.iter().enumerate() {
            for (&item, &qty) in order {
                demand_lines[item].push((o, qty));
            }
        }
        for (item, lines) in demand_lines.iter().enumerate() {
            if lines.is_empty() {
                continue;
            }
            let demand: Expr = lines.iter()
                .map(|&(o, qty)| qty as f64 * x[o])
                .grb_sum();
            let supply: Expr = instance.aisles_stocking(item).iter()
                .map(|&(a, qty)| qty as f64 * y[a])
                .grb_sum();
            model.add_constr(&format!("cover_{}", item), c!(demand <= supply))
                .map_err(|e| failed(&format!("Failed to add coverage constraint for item {}", item), e))?;
        }

        // Productivity cut
        let productivity: Expr = (0..n)
            .map(|o| instance.units(o) as f64 * x[o])
            .chain((0..m).map(|a| -ratio * y[a]))
            .grb_sum();
        model.add_constr("productivity", c!(productivity >= 0.0))
            .map_err(|e| failed("Failed to add productivity cut", e))?;

        model.optimize()
            .map_err(|e| failed("Failed to optimize", e))?;

        let status = model.status()
            .map_err(|e| failed("Failed to get status", e))?;

        log::debug!("Gurobi status {:?} at ratio {:.4} after {:.2}s", status, ratio, start.elapsed().as_secs_f64());

        if status != Status::Optimal && status != Status::TimeLimit && status != Status::SolutionLimit {
            return Ok(None);
        }

        let count = model.get_attr(attr::SolCount)
            .map_err(|e| failed("Failed to get solution count", e))?;
        if count <= 0 {
            return Ok(None);
        }

        let mut orders = BTreeSet::new();
        for (o, var) in x.iter().enumerate() {
            let val = model.get_obj_attr(attr::X, var)
                .map_err(|e| failed("Failed to get order value", e))?;
            if val > 0.5 {
                orders.insert(o);
            }
        }

        let mut aisles = BTreeSet::new();
        for (a, var) in y.iter().enumerate() {
            let val = model.get_obj_attr(attr::X, var)
                .map_err(|e| failed("Failed to get aisle value", e))?;
            if val > 0.5 {
                aisles.insert(a);
            }
        }

        let mut solution = Solution::from_sets(instance, orders, aisles, self.name());
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(Some(solution))
    }
}

impl RatioOracle for GurobiOracle {
    fn solve_feasibility(
        &self,
        instance: &WaveInstance,
        ratio: f64,
        time_cap: Duration,
    ) -> Result<Option<Solution>, OracleError> {
        self.build_and_solve(instance, ratio, time_cap)
    }

    fn name(&self) -> &str {
        "Gurobi"
    }
}
