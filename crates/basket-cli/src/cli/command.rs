use anyhow::{anyhow, Result};
use basket_core::models::{ItemId, Product, ShoppingItem};
use basket_core::Coordinator;

/// CLI command parsed from arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Plain list, ordered by aisle
    List,
    /// Shopping mode view with progress
    Shop,
    /// Catalog in aisle order
    Products,
    /// Catalog products not yet on the list
    Search { query: String },
    /// Add a catalog product to the list
    Add {
        product: String,
        quantity: Option<String>,
        note: Option<String>,
        /// Create the product first when no such product exists
        create: bool,
    },
    /// Add a free-text entry
    AddCustom {
        name: String,
        quantity: Option<String>,
        note: Option<String>,
    },
    /// Change quantity and/or note of an entry
    Edit {
        item: String,
        quantity: Option<String>,
        note: Option<String>,
    },
    /// Flip the checked state of an entry
    Check { item: String },
    /// Remove an entry from the list
    Remove { item: String },
    /// Remove every entry, or only the checked ones
    Clear { keep_unchecked: bool },
    ProductAdd { name: String },
    ProductRename { product: String, name: String },
    ProductDelete { product: String },
    /// Submit a complete catalog order
    ProductReorder { products: Vec<String> },
    ProductMove { product: String, position: usize },
    /// Put a product on the list, or take it off if already there
    Bulk {
        product: String,
        quantity: Option<String>,
    },
    /// Keep the update stream open and reprint on every change
    Watch { shopping: bool },
}

/// Find a catalog product by numeric id or by name (case-insensitive).
pub fn resolve_product(coordinator: &Coordinator, reference: &str) -> Result<Product> {
    let reference = reference.trim();
    let catalog = coordinator.catalog();

    if let Ok(id) = reference.parse::<i64>() {
        if let Some(product) = catalog.iter().find(|p| p.id == id) {
            return Ok(product.clone());
        }
    }

    coordinator
        .find_product(reference)
        .ok_or_else(|| anyhow!("No product named \"{}\"", reference))
}

/// Find a list entry by numeric id or by display name (case-insensitive).
pub fn resolve_item(coordinator: &Coordinator, reference: &str) -> Result<ShoppingItem> {
    let reference = reference.trim();
    let items = coordinator.plain_list();

    if let Ok(id) = reference.parse::<ItemId>() {
        if let Some(item) = items.iter().find(|i| i.id == id) {
            return Ok(item.clone());
        }
    }

    let wanted = reference.to_lowercase();
    let mut matches = items
        .into_iter()
        .filter(|i| i.display_name().to_lowercase() == wanted);
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item),
        (Some(_), Some(_)) => Err(anyhow!(
            "Several entries are called \"{}\"; use the id instead",
            reference
        )),
        (None, _) => Err(anyhow!("Nothing called \"{}\" on the list", reference)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use basket_core::api::{ApiError, ShoppingApi};
    use basket_core::models::{ClearMode, ItemUpdate, NewItem, ProductId};
    use std::sync::Arc;

    /// Read-only server with a fixed catalog and list
    struct StaticApi;

    #[async_trait]
    impl ShoppingApi for StaticApi {
        async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
            Ok(vec![Product::new(1, "Mleko", 1), Product::new(2, "Chleb", 2)])
        }
        async fn create_product(&self, _name: &str) -> Result<Product, ApiError> {
            unimplemented!()
        }
        async fn rename_product(&self, _id: ProductId, _name: &str) -> Result<Product, ApiError> {
            unimplemented!()
        }
        async fn delete_product(&self, _id: ProductId) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn reorder_products(&self, _order: &[ProductId]) -> Result<Vec<Product>, ApiError> {
            unimplemented!()
        }
        async fn fetch_shopping_list(&self) -> Result<Vec<ShoppingItem>, ApiError> {
            Ok(vec![
                ShoppingItem::catalog(10, 1, "Mleko", 1),
                ShoppingItem::custom(11, "Baterie", None),
                ShoppingItem::custom(12, "baterie", None),
            ])
        }
        async fn add_item(&self, _item: &NewItem) -> Result<ShoppingItem, ApiError> {
            unimplemented!()
        }
        async fn update_item(&self, _id: ItemId, _u: &ItemUpdate) -> Result<ShoppingItem, ApiError> {
            unimplemented!()
        }
        async fn delete_item(&self, _id: ItemId) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn set_checked(&self, _id: ItemId, _c: bool) -> Result<ShoppingItem, ApiError> {
            unimplemented!()
        }
        async fn clear_list(&self, _mode: ClearMode) -> Result<(), ApiError> {
            unimplemented!()
        }
    }

    async fn coordinator() -> Coordinator {
        let coordinator = Coordinator::new(Arc::new(StaticApi));
        coordinator.refresh().await.unwrap();
        coordinator
    }

    #[tokio::test]
    async fn test_resolve_product_by_id_or_name() {
        let coordinator = coordinator().await;
        assert_eq!(resolve_product(&coordinator, "2").unwrap().name, "Chleb");
        assert_eq!(resolve_product(&coordinator, " mleko ").unwrap().id, 1);
        assert!(resolve_product(&coordinator, "Ser").is_err());
    }

    #[tokio::test]
    async fn test_resolve_item_rejects_ambiguous_names() {
        let coordinator = coordinator().await;
        assert_eq!(resolve_item(&coordinator, "MLEKO").unwrap().id, 10);
        assert_eq!(resolve_item(&coordinator, "12").unwrap().id, 12);

        let err = resolve_item(&coordinator, "baterie").unwrap_err();
        assert!(err.to_string().contains("use the id"));
    }
}
