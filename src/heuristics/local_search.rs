//! Local search improvement heuristics for wave picking.
//!
//! Two single-order neighborhoods are explored with first improvement:
//! - removal of one selected order (aisle set rebuilt from scratch)
//! - addition of one unselected order (aisle set extended greedily)
//!
//! [`VND`] chains them, restarting from the first neighborhood after every
//! accepted move, until neither yields a strictly better ratio.

use crate::heuristics::construction::ratio;
use crate::heuristics::coverage::{extend_aisles, rebuild_aisles};
use crate::instance::WaveInstance;
use crate::solution::{Move, Solution};

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &WaveInstance, solution: &mut Solution) -> bool;
    fn name(&self) -> &str;
}

/// Remove-one-order neighborhood
///
/// Drops the first selected order (ascending index) whose removal strictly
/// improves the ratio while keeping the wave inside `[LB, UB]`. The aisle
/// set of the reduced wave is rebuilt from scratch since an aisle opened
/// for the removed order may still serve another one.
pub struct RemoveOrderSearch;

impl RemoveOrderSearch {
    pub fn new() -> Self {
        RemoveOrderSearch
    }
}

impl Default for RemoveOrderSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for RemoveOrderSearch {
    fn improve(&self, instance: &WaveInstance, solution: &mut Solution) -> bool {
        let current = ratio(solution.units, solution.aisles.len());

        let members: Vec<usize> = solution.orders.iter().copied().collect();
        for o in members {
            let mv = Move::DropOrder(o);
            let units = mv.units_after(instance, solution.units);
            if units < instance.wave_size_lb || units > instance.wave_size_ub {
                continue;
            }

            let orders = mv.apply(&solution.orders);
            let aisles = rebuild_aisles(instance, &orders);
            if ratio(units, aisles.len()) > current {
                solution.orders = orders;
                solution.aisles = aisles;
                solution.validate(instance);
                return true;
            }
        }

        false
    }

    fn name(&self) -> &str {
        "Remove"
    }
}

/// Add-one-order neighborhood
///
/// Adds the first unselected order (ascending index) that keeps the wave
/// under `UB` and strictly improves the ratio. The current aisle set is
/// extended, not rebuilt.
pub struct AddOrderSearch;

impl AddOrderSearch {
    pub fn new() -> Self {
        AddOrderSearch
    }
}

impl Default for AddOrderSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for AddOrderSearch {
    fn improve(&self, instance: &WaveInstance, solution: &mut Solution) -> bool {
        let current = ratio(solution.units, solution.aisles.len());

        for o in 0..instance.num_orders() {
            if solution.orders.contains(&o) {
                continue;
            }
            let mv = Move::AddOrder(o);
            let units = mv.units_after(instance, solution.units);
            if units > instance.wave_size_ub {
                continue;
            }

            let aisles = extend_aisles(instance, o, &solution.aisles);
            if ratio(units, aisles.len()) > current {
                solution.orders = mv.apply(&solution.orders);
                solution.aisles = aisles;
                solution.validate(instance);
                return true;
            }
        }

        false
    }

    fn name(&self) -> &str {
        "Add"
    }
}

/// Variable Neighborhood Descent (VND)
///
/// Applies multiple local search operators in a systematic way.
pub struct VND {
    /// List of local search operators
    operators: Vec<Box<dyn LocalSearch + Send + Sync>>,
}

impl VND {
    pub fn with_standard_operators() -> Self {
        let operators: Vec<Box<dyn LocalSearch + Send + Sync>> = vec![
            Box::new(RemoveOrderSearch::new()),
            Box::new(AddOrderSearch::new()),
        ];

        VND { operators }
    }
}

impl Default for VND {
    fn default() -> Self {
        Self::with_standard_operators()
    }
}

impl LocalSearch for VND {
    // Every accepted move strictly raises the ratio over a finite set of
    // waves, so the descent terminates without an iteration cap.
    fn improve(&self, instance: &WaveInstance, solution: &mut Solution) -> bool {
        let mut total_improved = false;
        let mut k = 0;
        let mut moves = 0;

        while k < self.operators.len() {
            if self.operators[k].improve(instance, solution) {
                total_improved = true;
                moves += 1;
                k = 0; // Restart from first operator
            } else {
                k += 1; // Move to next operator
            }
        }

        solution.iterations = Some(moves);
        total_improved
    }

    fn name(&self) -> &str {
        "VND"
    }
}
