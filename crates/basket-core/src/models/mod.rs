pub mod product;
pub mod shopping_item;

pub use product::{normalize_name, Product, ProductId};
pub use shopping_item::{
    non_blank, ClearMode, ItemId, ItemSource, ItemUpdate, NewItem, ShoppingItem,
};
