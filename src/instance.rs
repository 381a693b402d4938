//! Module for parsing and representing wave-picking instances.
//!
//! An instance is a catalog of customer orders and warehouse aisles, each a
//! mapping from item id to quantity, plus the wave-size window that bounds
//! the total number of units picked in one wave.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde::{Deserialize, Serialize};

/// Maximum number of aisles a wave may visit.
pub const MAX_AISLES: usize = 20;

/// Item id -> quantity. Ordered so every traversal is deterministic.
pub type ItemMap = BTreeMap<usize, i64>;

/// Represents a complete wave-picking instance
#[derive(Debug, Clone)]
pub struct WaveInstance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Number of distinct items; every item id lies in `0..num_items`
    pub num_items: usize,
    /// Demand of every order
    pub orders: Vec<ItemMap>,
    /// Supply of every aisle
    pub aisles: Vec<ItemMap>,
    /// Minimum number of units in a wave
    pub wave_size_lb: i64,
    /// Maximum number of units in a wave
    pub wave_size_ub: i64,
    /// Precomputed sum of quantities of each order
    units_per_order: Vec<i64>,
    /// For every item, the aisles stocking it as (aisle, quantity), ascending by aisle
    item_aisles: Vec<Vec<(usize, i64)>>,
}

impl WaveInstance {
    /// Build an instance from already materialized catalogs.
    ///
    /// Zero quantities are dropped; negative quantities, out-of-range item
    /// ids and an inverted wave window are rejected.
    pub fn new(
        name: &str,
        orders: Vec<ItemMap>,
        aisles: Vec<ItemMap>,
        num_items: usize,
        wave_size_lb: i64,
        wave_size_ub: i64,
    ) -> Result<Self, String> {
        if wave_size_lb > wave_size_ub {
            return Err(format!(
                "Invalid wave window: lower bound {} exceeds upper bound {}",
                wave_size_lb, wave_size_ub
            ));
        }

        let orders = orders.into_iter().enumerate()
            .map(|(o, map)| Self::clean_map(map, num_items).map_err(|e| format!("Order {}: {}", o, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let aisles = aisles.into_iter().enumerate()
            .map(|(a, map)| Self::clean_map(map, num_items).map_err(|e| format!("Aisle {}: {}", a, e)))
            .collect::<Result<Vec<_>, _>>()?;

        let units_per_order = orders.iter().map(|m| m.values().sum()).collect();

        let mut item_aisles = vec![Vec::new(); num_items];
        for (a, map) in aisles.iter().enumerate() {
            for (&item, &qty) in map {
                item_aisles[item].push((a, qty));
            }
        }

        Ok(WaveInstance {
            name: name.to_string(),
            num_items,
            orders,
            aisles,
            wave_size_lb,
            wave_size_ub,
            units_per_order,
            item_aisles,
        })
    }

    fn clean_map(map: ItemMap, num_items: usize) -> Result<ItemMap, String> {
        let mut cleaned = ItemMap::new();
        for (item, qty) in map {
            if item >= num_items {
                return Err(format!("item {} out of range (nItems = {})", item, num_items));
            }
            if qty < 0 {
                return Err(format!("negative quantity {} for item {}", qty, item));
            }
            if qty > 0 {
                *cleaned.entry(item).or_insert(0) += qty;
            }
        }
        Ok(cleaned)
    }

    /// Parse an instance from a file in the challenge text layout
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let file = File::open(&path)
            .map_err(|e| format!("Cannot open file: {}", e))?;
        let name = path.as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse(&name, BufReader::new(file))
    }

    /// Parse an instance held in memory
    pub fn from_str(name: &str, text: &str) -> Result<Self, String> {
        Self::parse(name, text.as_bytes())
    }

    fn parse<R: BufRead>(name: &str, reader: R) -> Result<Self, String> {
        let mut lines = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Read error: {}", e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            lines.push((number + 1, line.to_string()));
        }

        let mut cursor = lines.iter();

        let (header_no, header) = cursor.next().ok_or("Empty instance file")?;
        let header = parse_ints(*header_no, header)?;
        if header.len() < 3 {
            return Err(format!("Line {}: expected '<orders> <items> <aisles>'", header_no));
        }
        let num_orders = to_count(*header_no, header[0])?;
        let num_items = to_count(*header_no, header[1])?;
        let num_aisles = to_count(*header_no, header[2])?;

        let mut orders = Vec::with_capacity(num_orders);
        for o in 0..num_orders {
            let (no, line) = cursor.next()
                .ok_or_else(|| format!("Truncated file: missing order {} of {}", o, num_orders))?;
            orders.push(parse_item_line(*no, line, num_items)?);
        }

        let mut aisles = Vec::with_capacity(num_aisles);
        for a in 0..num_aisles {
            let (no, line) = cursor.next()
                .ok_or_else(|| format!("Truncated file: missing aisle {} of {}", a, num_aisles))?;
            aisles.push(parse_item_line(*no, line, num_items)?);
        }

        let (bounds_no, bounds) = cursor.next().ok_or("Truncated file: missing wave bounds")?;
        let bounds = parse_ints(*bounds_no, bounds)?;
        if bounds.len() < 2 {
            return Err(format!("Line {}: expected '<waveSizeLB> <waveSizeUB>'", bounds_no));
        }

        Self::new(name, orders, aisles, num_items, bounds[0], bounds[1])
    }

    /// Number of orders in the catalog
    #[inline]
    pub fn num_orders(&self) -> usize {
        self.orders.len()
    }

    /// Number of aisles in the catalog
    #[inline]
    pub fn num_aisles(&self) -> usize {
        self.aisles.len()
    }

    /// Total units requested by one order
    #[inline]
    pub fn units(&self, order: usize) -> i64 {
        self.units_per_order[order]
    }

    /// Quantity of `item` stocked in `aisle`
    #[inline]
    pub fn supply(&self, aisle: usize, item: usize) -> i64 {
        self.aisles[aisle].get(&item).copied().unwrap_or(0)
    }

    /// Aisles stocking `item`, ascending by aisle index
    #[inline]
    pub fn aisles_stocking(&self, item: usize) -> &[(usize, i64)] {
        &self.item_aisles[item]
    }

    /// Sum of all units requested by the catalog
    pub fn total_units(&self) -> i64 {
        self.units_per_order.iter().sum()
    }

    /// Total units of a set of orders
    pub fn wave_units(&self, orders: &BTreeSet<usize>) -> i64 {
        orders.iter().map(|&o| self.units_per_order[o]).sum()
    }

    /// Productivity ratio: units picked per visited aisle (0 for empty sets)
    pub fn objective(&self, orders: &BTreeSet<usize>, aisles: &BTreeSet<usize>) -> f64 {
        if orders.is_empty() || aisles.is_empty() {
            return 0.0;
        }
        self.wave_units(orders) as f64 / aisles.len() as f64
    }

    /// Verify that a wave satisfies every hard constraint
    pub fn is_feasible(&self, orders: &BTreeSet<usize>, aisles: &BTreeSet<usize>) -> bool {
        if orders.is_empty() || aisles.is_empty() || aisles.len() > MAX_AISLES {
            return false;
        }
        if orders.iter().any(|&o| o >= self.num_orders())
            || aisles.iter().any(|&a| a >= self.num_aisles())
        {
            return false;
        }

        let units = self.wave_units(orders);
        if units < self.wave_size_lb || units > self.wave_size_ub {
            return false;
        }

        let (picked, supplied) = self.item_balance(orders, aisles);
        picked.iter().zip(supplied.iter()).all(|(p, s)| p <= s)
    }

    /// Check feasibility and report every violated constraint
    pub fn check_feasibility_detailed(
        &self,
        orders: &BTreeSet<usize>,
        aisles: &BTreeSet<usize>,
    ) -> FeasibilityReport {
        let mut violations = Vec::new();

        if orders.is_empty() {
            violations.push(Violation::NoOrders);
        }
        if aisles.is_empty() {
            violations.push(Violation::NoAisles);
        }
        violations.extend(orders.iter().filter(|&&o| o >= self.num_orders()).map(|&o| Violation::UnknownOrder(o)));
        violations.extend(aisles.iter().filter(|&&a| a >= self.num_aisles()).map(|&a| Violation::UnknownAisle(a)));

        let known_orders: BTreeSet<usize> = orders.iter().copied().filter(|&o| o < self.num_orders()).collect();
        let known_aisles: BTreeSet<usize> = aisles.iter().copied().filter(|&a| a < self.num_aisles()).collect();

        let units = self.wave_units(&known_orders);
        if units < self.wave_size_lb {
            violations.push(Violation::BelowWaveLowerBound { units, bound: self.wave_size_lb });
        }
        if units > self.wave_size_ub {
            violations.push(Violation::AboveWaveUpperBound { units, bound: self.wave_size_ub });
        }
        if aisles.len() > MAX_AISLES {
            violations.push(Violation::TooManyAisles { count: aisles.len(), max: MAX_AISLES });
        }

        let (picked, supplied) = self.item_balance(&known_orders, &known_aisles);
        for item in 0..self.num_items {
            if picked[item] > supplied[item] {
                violations.push(Violation::UncoveredItem {
                    item,
                    demand: picked[item],
                    supply: supplied[item],
                });
            }
        }

        FeasibilityReport {
            feasible: violations.is_empty(),
            units,
            num_orders: orders.len(),
            num_aisles: aisles.len(),
            objective: self.objective(&known_orders, &known_aisles),
            violations,
        }
    }

    fn item_balance(&self, orders: &BTreeSet<usize>, aisles: &BTreeSet<usize>) -> (Vec<i64>, Vec<i64>) {
        let mut picked = vec![0i64; self.num_items];
        let mut supplied = vec![0i64; self.num_items];

        for &o in orders {
            for (&item, &qty) in &self.orders[o] {
                picked[item] += qty;
            }
        }
        for &a in aisles {
            for (&item, &qty) in &self.aisles[a] {
                supplied[item] += qty;
            }
        }

        (picked, supplied)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let total_supply: i64 = self.aisles.iter().flat_map(|m| m.values()).sum();
        let order_lines: usize = self.orders.iter().map(|m| m.len()).sum();
        let aisle_lines: usize = self.aisles.iter().map(|m| m.len()).sum();

        let avg_order_lines = if self.orders.is_empty() { 0.0 } else { order_lines as f64 / self.num_orders() as f64 };
        let avg_aisle_lines = if self.aisles.is_empty() { 0.0 } else { aisle_lines as f64 / self.num_aisles() as f64 };

        InstanceStatistics {
            name: self.name.clone(),
            num_orders: self.num_orders(),
            num_items: self.num_items,
            num_aisles: self.num_aisles(),
            wave_size_lb: self.wave_size_lb,
            wave_size_ub: self.wave_size_ub,
            total_demand: self.total_units(),
            total_supply,
            avg_order_lines,
            avg_aisle_lines,
            min_order_units: self.units_per_order.iter().copied().min().unwrap_or(0),
            max_order_units: self.units_per_order.iter().copied().max().unwrap_or(0),
            orders_within_ub: self.units_per_order.iter().filter(|&&u| u <= self.wave_size_ub).count(),
        }
    }
}

fn parse_ints(line_no: usize, line: &str) -> Result<Vec<i64>, String> {
    line.split_whitespace()
        .map(|tok| tok.parse::<i64>().map_err(|_| format!("Line {}: invalid integer '{}'", line_no, tok)))
        .collect()
}

fn to_count(line_no: usize, value: i64) -> Result<usize, String> {
    usize::try_from(value).map_err(|_| format!("Line {}: negative count {}", line_no, value))
}

fn parse_item_line(line_no: usize, line: &str, num_items: usize) -> Result<ItemMap, String> {
    let values = parse_ints(line_no, line)?;
    let (&count, pairs) = values.split_first()
        .ok_or_else(|| format!("Line {}: missing line count", line_no))?;
    let count = to_count(line_no, count)?;
    if pairs.len() < 2 * count {
        return Err(format!(
            "Line {}: expected {} item/quantity pairs, found {} values",
            line_no, count, pairs.len()
        ));
    }

    let mut map = ItemMap::new();
    for pair in pairs[..2 * count].chunks(2) {
        let item = to_count(line_no, pair[0])?;
        if item >= num_items {
            return Err(format!("Line {}: item {} out of range (nItems = {})", line_no, item, num_items));
        }
        *map.entry(item).or_insert(0) += pair[1];
    }
    Ok(map)
}

/// A single broken hard constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    NoOrders,
    NoAisles,
    UnknownOrder(usize),
    UnknownAisle(usize),
    BelowWaveLowerBound { units: i64, bound: i64 },
    AboveWaveUpperBound { units: i64, bound: i64 },
    TooManyAisles { count: usize, max: usize },
    UncoveredItem { item: usize, demand: i64, supply: i64 },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::NoOrders => write!(f, "no order selected"),
            Violation::NoAisles => write!(f, "no aisle visited"),
            Violation::UnknownOrder(o) => write!(f, "order {} does not exist", o),
            Violation::UnknownAisle(a) => write!(f, "aisle {} does not exist", a),
            Violation::BelowWaveLowerBound { units, bound } =>
                write!(f, "wave size {} below lower bound {}", units, bound),
            Violation::AboveWaveUpperBound { units, bound } =>
                write!(f, "wave size {} above upper bound {}", units, bound),
            Violation::TooManyAisles { count, max } =>
                write!(f, "{} aisles visited (max {})", count, max),
            Violation::UncoveredItem { item, demand, supply } =>
                write!(f, "item {}: demand {} exceeds supply {}", item, demand, supply),
        }
    }
}

/// Outcome of a detailed feasibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub feasible: bool,
    pub units: i64,
    pub num_orders: usize,
    pub num_aisles: usize,
    pub objective: f64,
    pub violations: Vec<Violation>,
}

impl std::fmt::Display for FeasibilityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Feasible: {}", self.feasible)?;
        writeln!(f, "  Orders: {}", self.num_orders)?;
        writeln!(f, "  Aisles: {}", self.num_aisles)?;
        writeln!(f, "  Units: {}", self.units)?;
        writeln!(f, "  Objective (units/aisle): {:.4}", self.objective)?;
        for violation in &self.violations {
            writeln!(f, "  Violation: {}", violation)?;
        }
        Ok(())
    }
}

/// Statistics about a wave-picking instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_orders: usize,
    pub num_items: usize,
    pub num_aisles: usize,
    pub wave_size_lb: i64,
    pub wave_size_ub: i64,
    pub total_demand: i64,
    pub total_supply: i64,
    pub avg_order_lines: f64,
    pub avg_aisle_lines: f64,
    pub min_order_units: i64,
    pub max_order_units: i64,
    pub orders_within_ub: usize,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Orders: {}", self.num_orders)?;
        writeln!(f, "  Items: {}", self.num_items)?;
        writeln!(f, "  Aisles: {}", self.num_aisles)?;
        writeln!(f, "  Wave window: [{}, {}]", self.wave_size_lb, self.wave_size_ub)?;
        writeln!(f, "  Total demand: {}", self.total_demand)?;
        writeln!(f, "  Total supply: {}", self.total_supply)?;
        writeln!(f, "  Avg lines per order: {:.2}", self.avg_order_lines)?;
        writeln!(f, "  Avg lines per aisle: {:.2}", self.avg_aisle_lines)?;
        writeln!(f, "  Order size: {}..={}", self.min_order_units, self.max_order_units)?;
        writeln!(f, "  Orders fitting the upper bound: {}", self.orders_within_ub)
    }
}
