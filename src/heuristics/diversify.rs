//! Random single-move perturbation used after the exact phase.

use crate::heuristics::coverage::rebuild_aisles;
use crate::instance::{WaveInstance, MAX_AISLES};
use crate::solution::{Move, Solution};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Random jump: add or drop one random order, then rebuild the aisles.
pub struct RandomJump {
    /// Probability of trying an addition before a removal
    pub add_probability: f64,
}

impl RandomJump {
    pub fn new() -> Self {
        RandomJump { add_probability: 0.5 }
    }

    /// Draw the move to apply to `base`, if any is possible
    pub fn draw_move(&self, instance: &WaveInstance, base: &Solution, rng: &mut ChaCha8Rng) -> Option<Move> {
        if rng.gen_bool(self.add_probability) && base.orders.len() < instance.num_orders() {
            let free: Vec<usize> = (0..instance.num_orders())
                .filter(|o| !base.orders.contains(o))
                .collect();
            free.choose(rng).map(|&o| Move::AddOrder(o))
        } else if base.orders.len() > 1 {
            let members: Vec<usize> = base.orders.iter().copied().collect();
            members.choose(rng).map(|&o| Move::DropOrder(o))
        } else {
            None
        }
    }

    /// Perturb `base` once. Returns `None` unless the result is feasible.
    pub fn perturb(&self, instance: &WaveInstance, base: &Solution, rng: &mut ChaCha8Rng) -> Option<Solution> {
        let orders = match self.draw_move(instance, base, rng) {
            Some(mv) => mv.apply(&base.orders),
            None => base.orders.clone(),
        };

        let aisles = rebuild_aisles(instance, &orders);
        let units = instance.wave_units(&orders);
        if units < instance.wave_size_lb
            || units > instance.wave_size_ub
            || aisles.is_empty()
            || aisles.len() > MAX_AISLES
        {
            return None;
        }

        let candidate = Solution::from_sets(instance, orders, aisles, self.name());
        if candidate.feasible {
            Some(candidate)
        } else {
            None
        }
    }

    pub fn name(&self) -> &str {
        "RandomJump"
    }
}

impl Default for RandomJump {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::ItemMap;
    use std::collections::BTreeSet;

    fn create_test_instance() -> WaveInstance {
        WaveInstance::new(
            "test",
            vec![
                ItemMap::from([(0, 2)]),
                ItemMap::from([(0, 2)]),
                ItemMap::from([(1, 3)]),
            ],
            vec![
                ItemMap::from([(0, 4)]),
                ItemMap::from([(1, 3)]),
            ],
            2,
            1,
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_perturb_changes_one_order() {
        let instance = create_test_instance();
        let base = Solution::from_sets(&instance, BTreeSet::from([0, 1]), BTreeSet::from([0]), "base");
        let jump = RandomJump::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..50 {
            if let Some(candidate) = jump.perturb(&instance, &base, &mut rng) {
                assert!(candidate.feasible);
                let diff = candidate.orders.symmetric_difference(&base.orders).count();
                assert_eq!(diff, 1);
            }
        }
    }

    #[test]
    fn test_single_order_base_never_drops() {
        let instance = create_test_instance();
        let base = Solution::from_sets(&instance, BTreeSet::from([2]), BTreeSet::from([1]), "base");
        let jump = RandomJump { add_probability: 0.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert_eq!(jump.draw_move(&instance, &base, &mut rng), None);
        let same = jump.perturb(&instance, &base, &mut rng).unwrap();
        assert_eq!(same.orders, base.orders);
    }

    #[test]
    fn test_full_base_never_adds() {
        let instance = create_test_instance();
        let base = Solution::from_sets(&instance, BTreeSet::from([0, 1, 2]), BTreeSet::from([0, 1]), "base");
        let jump = RandomJump { add_probability: 1.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(matches!(jump.draw_move(&instance, &base, &mut rng), Some(Move::DropOrder(_))));
    }

    #[test]
    fn test_prefilter_rejects_window_violation() {
        let mut instance = create_test_instance();
        instance.wave_size_lb = 7;
        let base = Solution::from_sets(&instance, BTreeSet::from([0, 1, 2]), BTreeSet::from([0, 1]), "base");
        let jump = RandomJump { add_probability: 0.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        // every drop leaves at most 5 units
        assert!(jump.perturb(&instance, &base, &mut rng).is_none());
    }
}
