//! Greedy aisle coverage for single orders.
//!
//! Every move of the search (construction, VND, diversification) reduces to
//! "which aisles must be visited so that this order can be picked". The
//! greedy answer is myopic: for each under-covered item it opens the aisle
//! with the largest stock of that item, once. It never checks that the
//! resulting stock is actually sufficient, so callers re-validate.

use crate::instance::WaveInstance;
use std::collections::BTreeSet;

/// Aisles to add so that `order` is covered on top of `current`.
///
/// Items are visited in ascending id order. An item already covered by
/// `current` plus the aisles added earlier in this call is skipped;
/// otherwise the unused aisle with the largest supply of it is added (ties
/// go to the lowest aisle index). Aisles without stock are never opened.
/// `current` is left untouched.
pub fn cover_order(instance: &WaveInstance, order: usize, current: &BTreeSet<usize>) -> BTreeSet<usize> {
    let mut added = BTreeSet::new();

    for (&item, &qty) in &instance.orders[order] {
        let covered: i64 = instance.aisles_stocking(item).iter()
            .filter(|(a, _)| current.contains(a) || added.contains(a))
            .map(|&(_, q)| q)
            .sum();
        if covered >= qty {
            continue;
        }

        let mut best: Option<(usize, i64)> = None;
        for &(a, q) in instance.aisles_stocking(item) {
            if current.contains(&a) || added.contains(&a) {
                continue;
            }
            if best.map_or(true, |(_, best_q)| q > best_q) {
                best = Some((a, q));
            }
        }

        if let Some((a, _)) = best {
            added.insert(a);
        }
    }

    added
}

/// `aisles` extended with the greedy cover of `order`
pub fn extend_aisles(instance: &WaveInstance, order: usize, aisles: &BTreeSet<usize>) -> BTreeSet<usize> {
    let mut extended = aisles.clone();
    extended.extend(cover_order(instance, order, aisles));
    extended
}

/// Rebuild an aisle set from scratch for a set of orders, covering them
/// one at a time in ascending index order.
pub fn rebuild_aisles(instance: &WaveInstance, orders: &BTreeSet<usize>) -> BTreeSet<usize> {
    let mut aisles = BTreeSet::new();
    for &o in orders {
        let added = cover_order(instance, o, &aisles);
        aisles.extend(added);
    }
    aisles
}

/// Repeat [`cover_order`] until every demand line of `order` is met.
///
/// Returns `None` when a pass adds no aisle while some item is still short,
/// i.e. the remaining aisles cannot cover the order.
pub fn cover_order_fully(
    instance: &WaveInstance,
    order: usize,
    current: &BTreeSet<usize>,
) -> Option<BTreeSet<usize>> {
    let mut added = BTreeSet::new();

    loop {
        let committed: BTreeSet<usize> = current.union(&added).copied().collect();
        if is_order_covered(instance, order, &committed) {
            return Some(added);
        }
        let more = cover_order(instance, order, &committed);
        if more.is_empty() {
            return None;
        }
        added.extend(more);
    }
}

/// Whether `aisles` stock every demand line of `order` on their own
pub fn is_order_covered(instance: &WaveInstance, order: usize, aisles: &BTreeSet<usize>) -> bool {
    instance.orders[order].iter().all(|(&item, &qty)| {
        let stocked: i64 = aisles.iter().map(|&a| instance.supply(a, item)).sum();
        stocked >= qty
    })
}
