//! Solution representation and manipulation for wave picking.
//!
//! A solution is a pair of index sets: the selected orders and the visited
//! aisles. Cached fields (units, objective, feasibility) are recomputed from
//! the instance whenever the sets change.

use crate::instance::WaveInstance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Represents a solution to the wave-picking problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Selected order indices
    pub orders: BTreeSet<usize>,
    /// Visited aisle indices
    pub aisles: BTreeSet<usize>,
    /// Total units picked by the selected orders
    pub units: i64,
    /// Objective value: units picked per visited aisle
    pub objective: f64,
    /// Whether the solution is feasible
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            orders: BTreeSet::new(),
            aisles: BTreeSet::new(),
            units: 0,
            objective: 0.0,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Create a solution from its two index sets
    pub fn from_sets(
        instance: &WaveInstance,
        orders: BTreeSet<usize>,
        aisles: BTreeSet<usize>,
        algorithm: &str,
    ) -> Self {
        let mut solution = Solution {
            orders,
            aisles,
            algorithm: algorithm.to_string(),
            ..Solution::new()
        };
        solution.validate(instance);
        solution
    }

    /// Validate and update solution properties
    pub fn validate(&mut self, instance: &WaveInstance) {
        self.feasible = instance.is_feasible(&self.orders, &self.aisles);
        self.units = self.orders.iter()
            .filter(|&&o| o < instance.num_orders())
            .map(|&o| instance.units(o))
            .sum();
        self.objective = if self.orders.is_empty() || self.aisles.is_empty() {
            0.0
        } else {
            self.units as f64 / self.aisles.len() as f64
        };
    }

    /// Number of selected orders
    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    /// Number of visited aisles
    pub fn num_aisles(&self) -> usize {
        self.aisles.len()
    }

    /// Write the solution in the challenge layout: the order count, one
    /// order per line, the aisle count, one aisle per line.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let mut file = File::create(&path)
            .map_err(|e| format!("Cannot create file: {}", e))?;
        file.write_all(self.to_challenge_format().as_bytes())
            .map_err(|e| format!("Write error: {}", e))
    }

    /// Render the challenge layout as a string
    pub fn to_challenge_format(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.orders.len()));
        for o in &self.orders {
            out.push_str(&format!("{}\n", o));
        }
        out.push_str(&format!("{}\n", self.aisles.len()));
        for a in &self.aisles {
            out.push_str(&format!("{}\n", a));
        }
        out
    }

    /// Read a solution file written in the challenge layout
    pub fn from_file<P: AsRef<Path>>(instance: &WaveInstance, path: P) -> Result<Self, String> {
        let file = File::open(&path)
            .map_err(|e| format!("Cannot open file: {}", e))?;
        Self::parse(instance, BufReader::new(file))
    }

    /// Parse a solution held in memory
    pub fn from_str(instance: &WaveInstance, text: &str) -> Result<Self, String> {
        Self::parse(instance, text.as_bytes())
    }

    fn parse<R: BufRead>(instance: &WaveInstance, reader: R) -> Result<Self, String> {
        let mut values = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| format!("Read error: {}", e))?;
            for tok in line.split_whitespace() {
                let v: usize = tok.parse().map_err(|_| format!("Invalid index '{}'", tok))?;
                values.push(v);
            }
        }

        let mut cursor = values.into_iter();
        let num_orders = cursor.next().ok_or("Missing order count")?;
        let orders: BTreeSet<usize> = cursor.by_ref().take(num_orders).collect();
        if orders.len() != num_orders {
            return Err(format!("Expected {} distinct orders, found {}", num_orders, orders.len()));
        }
        let num_aisles = cursor.next().ok_or("Missing aisle count")?;
        let aisles: BTreeSet<usize> = cursor.by_ref().take(num_aisles).collect();
        if aisles.len() != num_aisles {
            return Err(format!("Expected {} distinct aisles, found {}", num_aisles, aisles.len()));
        }

        Ok(Solution::from_sets(instance, orders, aisles, "File"))
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Objective: {:.4}", self.objective)?;
        writeln!(f, "  Units: {}", self.units)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Orders: {:?}", self.orders)?;
        writeln!(f, "  Aisles: {:?}", self.aisles)
    }
}

/// Represents a single-order move on the selected order set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    AddOrder(usize),
    DropOrder(usize),
}

impl Move {
    /// Order set obtained by applying the move
    pub fn apply(&self, orders: &BTreeSet<usize>) -> BTreeSet<usize> {
        let mut next = orders.clone();
        match *self {
            Move::AddOrder(o) => {
                next.insert(o);
            }
            Move::DropOrder(o) => {
                next.remove(&o);
            }
        }
        next
    }

    /// Units of the wave after the move
    pub fn units_after(&self, instance: &WaveInstance, units: i64) -> i64 {
        match *self {
            Move::AddOrder(o) => units + instance.units(o),
            Move::DropOrder(o) => units - instance.units(o),
        }
    }
}
