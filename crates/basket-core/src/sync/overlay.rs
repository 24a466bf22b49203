use std::collections::HashMap;

use crate::models::{ItemId, ItemUpdate, Product, ProductId, ShoppingItem};
use crate::ordering::{assign_dense_positions, sort_catalog};

/// Field values written locally but not yet confirmed by a refresh.
/// `None` means the confirmed value shows through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdit {
    pub quantity: Option<String>,
    pub note: Option<String>,
    pub is_checked: Option<bool>,
}

/// Optimistic edits layered over the confirmed snapshot.
///
/// Cleared wholesale by every successful refresh, so a rejected edit can at
/// worst be visible until the next refresh lands.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    edits: HashMap<ItemId, PendingEdit>,
    product_order: Option<Vec<ProductId>>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.product_order.is_none()
    }

    pub fn edit(&self, id: ItemId) -> Option<&PendingEdit> {
        self.edits.get(&id)
    }

    /// Record the fields an update sets. Absent fields are left unchanged,
    /// matching how the server applies the same update.
    pub fn record_update(&mut self, id: ItemId, update: &ItemUpdate) {
        let edit = self.edits.entry(id).or_default();
        if let Some(quantity) = &update.quantity {
            edit.quantity = Some(quantity.clone());
        }
        if let Some(note) = &update.note {
            edit.note = Some(note.clone());
        }
    }

    pub fn record_checked(&mut self, id: ItemId, is_checked: bool) {
        self.edits.entry(id).or_default().is_checked = Some(is_checked);
    }

    /// Forget the fields a rejected update set. Other pending fields of the
    /// same entry stay.
    pub fn discard_update(&mut self, id: ItemId, update: &ItemUpdate) -> bool {
        self.discard_with(id, |edit| {
            if update.quantity.is_some() {
                edit.quantity = None;
            }
            if update.note.is_some() {
                edit.note = None;
            }
        })
    }

    pub fn discard_checked(&mut self, id: ItemId) -> bool {
        self.discard_with(id, |edit| edit.is_checked = None)
    }

    fn discard_with(&mut self, id: ItemId, clear: impl FnOnce(&mut PendingEdit)) -> bool {
        let Some(edit) = self.edits.get_mut(&id) else {
            return false;
        };
        clear(edit);
        if *edit == PendingEdit::default() {
            self.edits.remove(&id);
        }
        true
    }

    pub fn record_product_order(&mut self, order: Vec<ProductId>) {
        self.product_order = Some(order);
    }

    pub fn discard_product_order(&mut self) -> bool {
        self.product_order.take().is_some()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.product_order = None;
    }

    /// Catalog as it should render: pending order applied, sorted.
    pub fn apply_products(&self, products: &[Product]) -> Vec<Product> {
        match &self.product_order {
            Some(order) => assign_dense_positions(products, order),
            None => {
                let mut products = products.to_vec();
                sort_catalog(&mut products);
                products
            }
        }
    }

    /// List entries with pending field edits applied. Catalog-backed entries
    /// also pick up positions from a pending reorder. Order is unchanged.
    pub fn apply_items(&self, items: &[ShoppingItem], products: &[Product]) -> Vec<ShoppingItem> {
        let positions: Option<HashMap<ProductId, i64>> = self.product_order.as_ref().map(|order| {
            assign_dense_positions(products, order)
                .into_iter()
                .map(|p| (p.id, p.sort_order))
                .collect()
        });

        items
            .iter()
            .map(|item| {
                let mut item = item.clone();
                if let Some(edit) = self.edits.get(&item.id) {
                    if let Some(quantity) = &edit.quantity {
                        item.quantity = Some(quantity.clone());
                    }
                    if let Some(note) = &edit.note {
                        item.note = Some(note.clone());
                    }
                    if let Some(is_checked) = edit.is_checked {
                        item.is_checked = is_checked;
                    }
                }
                if let (Some(positions), Some(product_id)) = (&positions, item.product_id()) {
                    if let Some(position) = positions.get(&product_id) {
                        item.product_sort_order = Some(*position);
                    }
                }
                item
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_shadow_confirmed_values() {
        let items = vec![
            ShoppingItem::catalog(1, 10, "Mleko", 1),
            ShoppingItem::custom(2, "Baterie", None),
        ];
        let mut overlay = Overlay::new();
        overlay.record_checked(1, true);
        overlay.record_update(2, &ItemUpdate::new(Some("4 szt".to_string()), None));

        let view = overlay.apply_items(&items, &[]);
        assert!(view[0].is_checked);
        assert_eq!(view[1].quantity.as_deref(), Some("4 szt"));
        assert_eq!(view[1].note, None);
        // Confirmed data is untouched
        assert!(!items[0].is_checked);
    }

    #[test]
    fn test_update_keeps_earlier_fields() {
        let mut overlay = Overlay::new();
        overlay.record_update(1, &ItemUpdate::new(Some("1 l".to_string()), None));
        overlay.record_update(1, &ItemUpdate::new(None, Some("zimne".to_string())));
        overlay.record_checked(1, false);

        assert_eq!(
            overlay.edit(1),
            Some(&PendingEdit {
                quantity: Some("1 l".to_string()),
                note: Some("zimne".to_string()),
                is_checked: Some(false),
            })
        );
    }

    #[test]
    fn test_discard_restores_confirmed_view() {
        let items = vec![ShoppingItem::catalog(1, 10, "Mleko", 1)];
        let mut overlay = Overlay::new();
        overlay.record_checked(1, true);
        assert!(overlay.discard_checked(1));
        assert!(!overlay.discard_checked(1));
        assert!(overlay.is_empty());
        assert_eq!(overlay.apply_items(&items, &[]), items);
    }

    #[test]
    fn test_discard_keeps_unrelated_fields() {
        let mut overlay = Overlay::new();
        overlay.record_checked(1, true);
        let update = ItemUpdate::new(Some("2 kg".to_string()), None);
        overlay.record_update(1, &update);

        assert!(overlay.discard_update(1, &update));
        assert_eq!(
            overlay.edit(1),
            Some(&PendingEdit {
                quantity: None,
                note: None,
                is_checked: Some(true),
            })
        );

        assert!(overlay.discard_checked(1));
        assert_eq!(overlay.edit(1), None);
    }

    #[test]
    fn test_pending_order_moves_products_and_entries() {
        let products = vec![Product::new(1, "A", 1), Product::new(2, "B", 2)];
        let items = vec![
            ShoppingItem::catalog(7, 1, "A", 1),
            ShoppingItem::catalog(8, 2, "B", 2),
        ];
        let mut overlay = Overlay::new();
        overlay.record_product_order(vec![2, 1]);

        let catalog: Vec<ProductId> = overlay.apply_products(&products).iter().map(|p| p.id).collect();
        assert_eq!(catalog, vec![2, 1]);

        let view = overlay.apply_items(&items, &products);
        assert_eq!(view[0].position(), Some(2));
        assert_eq!(view[1].position(), Some(1));

        assert!(overlay.discard_product_order());
        let catalog: Vec<ProductId> = overlay.apply_products(&products).iter().map(|p| p.id).collect();
        assert_eq!(catalog, vec![1, 2]);
    }
}
