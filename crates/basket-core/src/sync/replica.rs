use crate::models::{Product, ProductId, ShoppingItem};

/// Last confirmed server state. Both collections come from the same refresh
/// and are swapped in together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Catalog, sorted by position
    pub products: Vec<Product>,
    /// List entries in server order
    pub items: Vec<ShoppingItem>,
    /// Bumped on every successful refresh; 0 until the first one
    pub version: u64,
}

impl Snapshot {
    pub fn is_loaded(&self) -> bool {
        self.version > 0
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// The list entry backed by `product_id`, if the product is on the list
    pub fn entry_for_product(&self, product_id: ProductId) -> Option<&ShoppingItem> {
        self.items.iter().find(|i| i.product_id() == Some(product_id))
    }
}
