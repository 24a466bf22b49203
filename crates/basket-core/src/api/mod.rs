//! Request/response layer for products and list entries.
//!
//! The coordinator only sees [`ShoppingApi`]; [`HttpApi`] is the production
//! implementation talking to the household server.

pub mod error;
pub mod http;

use async_trait::async_trait;

use crate::models::{ClearMode, ItemId, ItemUpdate, NewItem, Product, ProductId, ShoppingItem};

pub use error::ApiError;
pub use http::HttpApi;

#[async_trait]
pub trait ShoppingApi: Send + Sync {
    /// Full catalog, ordered by position.
    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError>;

    async fn create_product(&self, name: &str) -> Result<Product, ApiError>;

    async fn rename_product(&self, id: ProductId, name: &str) -> Result<Product, ApiError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), ApiError>;

    /// Submit the full ordered identifier sequence; returns the catalog as
    /// stored afterwards.
    async fn reorder_products(&self, order: &[ProductId]) -> Result<Vec<Product>, ApiError>;

    /// Full list with joined product name and position.
    async fn fetch_shopping_list(&self) -> Result<Vec<ShoppingItem>, ApiError>;

    async fn add_item(&self, item: &NewItem) -> Result<ShoppingItem, ApiError>;

    async fn update_item(&self, id: ItemId, update: &ItemUpdate)
        -> Result<ShoppingItem, ApiError>;

    async fn delete_item(&self, id: ItemId) -> Result<(), ApiError>;

    async fn set_checked(&self, id: ItemId, is_checked: bool) -> Result<ShoppingItem, ApiError>;

    async fn clear_list(&self, mode: ClearMode) -> Result<(), ApiError>;
}
