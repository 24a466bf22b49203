use crate::api::ApiError;
use crate::models::{ItemId, ProductId};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Refused locally; no request is sent.
    #[error("\"{name}\" is on the shopping list and cannot be deleted")]
    ProductInUse { id: ProductId, name: String },

    #[error("Unknown product {0}")]
    UnknownProduct(ProductId),

    #[error("Unknown shopping list item {0}")]
    UnknownItem(ItemId),

    #[error("Name cannot be empty")]
    EmptyName,
}

impl SyncError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Api(e) if e.is_auth())
    }
}
