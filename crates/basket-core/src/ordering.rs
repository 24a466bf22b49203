//! Ordering and grouping rules applied to fetched data before rendering.
//!
//! Every view is re-derived from the confirmed replica, so these are pure
//! functions over slices. Sorts are stable: entries that compare equal keep
//! the order the server returned them in.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::constants::SEARCH_RESULT_LIMIT;
use crate::models::{Product, ProductId, ShoppingItem};

/// Position given to entries without a backing product
pub const UNBOUNDED_POSITION: i64 = i64::MAX;

fn effective_position(item: &ShoppingItem) -> i64 {
    item.position().unwrap_or(UNBOUNDED_POSITION)
}

/// Plain list view: by product position, custom entries last.
pub fn compare_plain(a: &ShoppingItem, b: &ShoppingItem) -> Ordering {
    effective_position(a).cmp(&effective_position(b))
}

/// Shopping mode: unchecked first, then product position, then the
/// custom entry's own sort value.
pub fn compare_shopping_mode(a: &ShoppingItem, b: &ShoppingItem) -> Ordering {
    a.is_checked
        .cmp(&b.is_checked)
        .then_with(|| compare_plain(a, b))
        .then_with(|| a.sort_order.unwrap_or(0).cmp(&b.sort_order.unwrap_or(0)))
}

pub fn sort_plain(items: &mut [ShoppingItem]) {
    items.sort_by(compare_plain);
}

pub fn sort_shopping_mode(items: &mut [ShoppingItem]) {
    items.sort_by(compare_shopping_mode);
}

pub fn sort_catalog(products: &mut [Product]) {
    products.sort_by_key(|p| p.sort_order);
}

/// Apply a bulk reorder the way the server does: the n-th identifier in
/// `order` gets position n (1-based). Products missing from `order` keep
/// their position and unknown identifiers are skipped. The result is sorted.
pub fn assign_dense_positions(products: &[Product], order: &[ProductId]) -> Vec<Product> {
    let mut updated = products.to_vec();
    for (index, id) in order.iter().enumerate() {
        if let Some(product) = updated.iter_mut().find(|p| p.id == *id) {
            product.sort_order = index as i64 + 1;
        }
    }
    sort_catalog(&mut updated);
    updated
}

/// Move the identifier at `from` to `to`, shifting the ones in between.
/// Out-of-range indices leave the order untouched.
pub fn move_id(order: &[ProductId], from: usize, to: usize) -> Vec<ProductId> {
    let mut moved = order.to_vec();
    if from >= moved.len() || to >= moved.len() || from == to {
        return moved;
    }
    let id = moved.remove(from);
    moved.insert(to, id);
    moved
}

/// Products whose name contains `query` (case-insensitive) and which are not
/// already on the list. Catalog order, capped at SEARCH_RESULT_LIMIT.
pub fn search_products<'a>(
    products: &'a [Product],
    items: &[ShoppingItem],
    query: &str,
) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let on_list: HashSet<ProductId> = items.iter().filter_map(|i| i.product_id()).collect();

    products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&query) && !on_list.contains(&p.id))
        .take(SEARCH_RESULT_LIMIT)
        .collect()
}

/// Whether a product with exactly this name (ignoring case) exists.
pub fn exact_match<'a>(products: &'a [Product], name: &str) -> Option<&'a Product> {
    let name = name.trim().to_lowercase();
    products.iter().find(|p| p.name.to_lowercase() == name)
}

/// Checked vs. total counts for shopping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub checked: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(items: &[ShoppingItem]) -> Self {
        Self {
            checked: items.iter().filter(|i| i.is_checked).count(),
            total: items.len(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.total - self.checked
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.checked == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[ShoppingItem]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    fn checked(mut item: ShoppingItem) -> ShoppingItem {
        item.is_checked = true;
        item
    }

    #[test]
    fn test_plain_sorts_by_position_custom_last() {
        let mut items = vec![
            ShoppingItem::custom(1, "Baterie", Some(0)),
            ShoppingItem::catalog(2, 20, "Chleb", 5),
            ShoppingItem::catalog(3, 30, "Mleko", 1),
            ShoppingItem::custom(4, "Kwiaty", None),
        ];
        sort_plain(&mut items);
        assert_eq!(ids(&items), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_plain_ignores_checked_state() {
        let mut items = vec![
            checked(ShoppingItem::catalog(1, 10, "A", 1)),
            ShoppingItem::catalog(2, 20, "B", 2),
        ];
        sort_plain(&mut items);
        assert_eq!(ids(&items), vec![1, 2]);
    }

    #[test]
    fn test_shopping_mode_unchecked_first() {
        let mut items = vec![
            checked(ShoppingItem::catalog(1, 10, "A", 1)),
            ShoppingItem::custom(2, "Z", Some(3)),
            ShoppingItem::catalog(3, 30, "C", 9),
            checked(ShoppingItem::custom(4, "Y", Some(1))),
            ShoppingItem::custom(5, "X", Some(1)),
        ];
        sort_shopping_mode(&mut items);
        assert_eq!(ids(&items), vec![3, 5, 2, 1, 4]);
    }

    #[test]
    fn test_shopping_mode_custom_sort_defaults_to_zero() {
        let mut items = vec![
            ShoppingItem::custom(1, "B", Some(2)),
            ShoppingItem::custom(2, "A", None),
            ShoppingItem::custom(3, "C", Some(-1)),
        ];
        sort_shopping_mode(&mut items);
        assert_eq!(ids(&items), vec![3, 2, 1]);
    }

    #[test]
    fn test_shopping_mode_ordering_law() {
        // Deterministic pseudo-random sets
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as i64
        };

        for round in 0..200 {
            let count = (next() % 12) as usize + 1;
            let mut items: Vec<ShoppingItem> = (0..count)
                .map(|i| {
                    let id = (round * 100 + i) as i64;
                    let mut item = if next() % 3 == 0 {
                        ShoppingItem::custom(id, "custom", Some(next() % 5))
                    } else {
                        ShoppingItem::catalog(id, id, "product", next() % 20)
                    };
                    item.is_checked = next() % 2 == 0;
                    item
                })
                .collect();

            sort_shopping_mode(&mut items);

            let first_checked = items.iter().position(|i| i.is_checked).unwrap_or(items.len());
            assert!(items[..first_checked].iter().all(|i| !i.is_checked));
            assert!(items[first_checked..].iter().all(|i| i.is_checked));

            for partition in [&items[..first_checked], &items[first_checked..]] {
                let positions: Vec<i64> =
                    partition.iter().filter_map(|i| i.position()).collect();
                assert!(positions.windows(2).all(|w| w[0] <= w[1]));
                // Catalog-backed entries precede custom ones
                if let Some(first_custom) = partition.iter().position(|i| i.is_custom()) {
                    assert!(partition[first_custom..].iter().all(|i| i.is_custom()));
                }
            }
        }
    }

    #[test]
    fn test_assign_dense_positions() {
        let products = vec![
            Product::new(1, "A", 1),
            Product::new(2, "B", 2),
            Product::new(3, "C", 3),
        ];
        let reordered = assign_dense_positions(&products, &[3, 1, 2]);
        let order: Vec<(i64, i64)> = reordered.iter().map(|p| (p.id, p.sort_order)).collect();
        assert_eq!(order, vec![(3, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_reorder_is_idempotent() {
        let products = vec![
            Product::new(1, "A", 4),
            Product::new(2, "B", 9),
            Product::new(3, "C", 1),
        ];
        let sequence = [2, 3, 1];
        let once = assign_dense_positions(&products, &sequence);
        let twice = assign_dense_positions(&once, &sequence);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reorder_skips_unknown_ids() {
        let products = vec![Product::new(1, "A", 1), Product::new(2, "B", 2)];
        let reordered = assign_dense_positions(&products, &[99, 2, 1]);
        let order: Vec<(i64, i64)> = reordered.iter().map(|p| (p.id, p.sort_order)).collect();
        assert_eq!(order, vec![(2, 2), (1, 3)]);
    }

    #[test]
    fn test_move_id() {
        assert_eq!(move_id(&[1, 2, 3, 4], 0, 2), vec![2, 3, 1, 4]);
        assert_eq!(move_id(&[1, 2, 3, 4], 3, 0), vec![4, 1, 2, 3]);
        assert_eq!(move_id(&[1, 2], 0, 5), vec![1, 2]);
    }

    #[test]
    fn test_search_excludes_listed_products() {
        let products = vec![
            Product::new(1, "Mleko", 1),
            Product::new(2, "Mleko kokosowe", 2),
            Product::new(3, "Chleb", 3),
        ];
        let items = vec![ShoppingItem::catalog(10, 1, "Mleko", 1)];
        let found: Vec<i64> = search_products(&products, &items, "MLE")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(found, vec![2]);
        assert!(search_products(&products, &items, "  ").is_empty());
    }

    #[test]
    fn test_search_caps_results() {
        let products: Vec<Product> = (0..25).map(|i| Product::new(i, "ser", i)).collect();
        assert_eq!(search_products(&products, &[], "ser").len(), SEARCH_RESULT_LIMIT);
    }

    #[test]
    fn test_exact_match_ignores_case() {
        let products = vec![Product::new(1, "Jajka", 1)];
        assert_eq!(exact_match(&products, " jajka ").map(|p| p.id), Some(1));
        assert!(exact_match(&products, "jaj").is_none());
    }

    #[test]
    fn test_progress() {
        let items = vec![
            checked(ShoppingItem::catalog(1, 1, "A", 1)),
            ShoppingItem::custom(2, "B", None),
        ];
        let progress = Progress::of(&items);
        assert_eq!(progress, Progress { checked: 1, total: 2 });
        assert_eq!(progress.remaining(), 1);
        assert!(!progress.is_complete());
        assert!(!Progress::of(&[]).is_complete());
    }
}
