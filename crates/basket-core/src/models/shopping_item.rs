use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::product::ProductId;

pub type ItemId = i64;

/// What a list entry points at. Exactly one of the two, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSource {
    /// Backed by a catalog product
    Catalog { product_id: ProductId },
    /// Free-text entry with no product behind it
    Custom { name: String },
}

/// One line on the shopping list, as served by `GET /shopping`.
///
/// The product name and position are joined in by the server so the list
/// can be rendered and ordered without the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireShoppingItem", into = "WireShoppingItem")]
pub struct ShoppingItem {
    pub id: ItemId,
    pub source: ItemSource,
    pub quantity: Option<String>,
    pub note: Option<String>,
    pub is_checked: bool,
    /// Secondary ordering key, only meaningful for custom entries
    pub sort_order: Option<i64>,
    pub product_name: Option<String>,
    pub product_sort_order: Option<i64>,
    pub created_at: Option<NaiveDateTime>,
}

impl ShoppingItem {
    pub fn catalog(id: ItemId, product_id: ProductId, product_name: &str, position: i64) -> Self {
        Self {
            id,
            source: ItemSource::Catalog { product_id },
            quantity: None,
            note: None,
            is_checked: false,
            sort_order: None,
            product_name: Some(product_name.to_string()),
            product_sort_order: Some(position),
            created_at: None,
        }
    }

    pub fn custom(id: ItemId, name: &str, sort_order: Option<i64>) -> Self {
        Self {
            id,
            source: ItemSource::Custom {
                name: name.to_string(),
            },
            quantity: None,
            note: None,
            is_checked: false,
            sort_order,
            product_name: None,
            product_sort_order: None,
            created_at: None,
        }
    }

    pub fn product_id(&self) -> Option<ProductId> {
        match self.source {
            ItemSource::Catalog { product_id } => Some(product_id),
            ItemSource::Custom { .. } => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.source, ItemSource::Custom { .. })
    }

    /// Product position for catalog-backed entries.
    pub fn position(&self) -> Option<i64> {
        match self.source {
            ItemSource::Catalog { .. } => self.product_sort_order,
            ItemSource::Custom { .. } => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match &self.source {
            ItemSource::Catalog { .. } => self.product_name.as_deref().unwrap_or(""),
            ItemSource::Custom { name } => name,
        }
    }

    /// Decode a list response row by row. Rows that do not decode are
    /// logged and left out so one bad row cannot block the whole list.
    pub fn from_rows(rows: Vec<Value>) -> Vec<Self> {
        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<Self>(row) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "skipping undecodable shopping list row");
                    None
                }
            })
            .collect()
    }
}

/// Flat JSON shape used by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireShoppingItem {
    id: ItemId,
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    custom_name: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    is_checked: bool,
    #[serde(default)]
    sort_order: Option<i64>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    product_sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<NaiveDateTime>,
}

impl TryFrom<WireShoppingItem> for ShoppingItem {
    type Error = String;

    fn try_from(wire: WireShoppingItem) -> Result<Self, Self::Error> {
        let source = match (wire.product_id, wire.custom_name) {
            (Some(product_id), None) => ItemSource::Catalog { product_id },
            (None, Some(name)) => ItemSource::Custom { name },
            (Some(_), Some(_)) => {
                return Err(format!(
                    "shopping item {} has both product_id and custom_name",
                    wire.id
                ))
            }
            (None, None) => {
                return Err(format!(
                    "shopping item {} has neither product_id nor custom_name",
                    wire.id
                ))
            }
        };

        Ok(Self {
            id: wire.id,
            source,
            quantity: wire.quantity,
            note: wire.note,
            is_checked: wire.is_checked,
            sort_order: wire.sort_order,
            product_name: wire.product_name,
            product_sort_order: wire.product_sort_order,
            created_at: wire.created_at,
        })
    }
}

impl From<ShoppingItem> for WireShoppingItem {
    fn from(item: ShoppingItem) -> Self {
        let (product_id, custom_name) = match item.source {
            ItemSource::Catalog { product_id } => (Some(product_id), None),
            ItemSource::Custom { name } => (None, Some(name)),
        };
        Self {
            id: item.id,
            product_id,
            custom_name,
            quantity: item.quantity,
            note: item.note,
            is_checked: item.is_checked,
            sort_order: item.sort_order,
            product_name: item.product_name,
            product_sort_order: item.product_sort_order,
            created_at: item.created_at,
        }
    }
}

/// Blank free-form text is sent as null.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /shopping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "WireNewItem")]
pub struct NewItem {
    pub source: ItemSource,
    pub quantity: Option<String>,
    pub note: Option<String>,
}

#[derive(Serialize)]
struct WireNewItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_name: Option<String>,
    quantity: Option<String>,
    note: Option<String>,
}

impl From<NewItem> for WireNewItem {
    fn from(item: NewItem) -> Self {
        let (product_id, custom_name) = match item.source {
            ItemSource::Catalog { product_id } => (Some(product_id), None),
            ItemSource::Custom { name } => (None, Some(name)),
        };
        Self {
            product_id,
            custom_name,
            quantity: item.quantity,
            note: item.note,
        }
    }
}

impl NewItem {
    pub fn from_product(product_id: ProductId) -> Self {
        Self {
            source: ItemSource::Catalog { product_id },
            quantity: None,
            note: None,
        }
    }

    /// None when the name is blank.
    pub fn custom(name: &str) -> Option<Self> {
        let name = super::product::normalize_name(name)?;
        Some(Self {
            source: ItemSource::Custom { name },
            quantity: None,
            note: None,
        })
    }

    pub fn with_quantity(mut self, quantity: Option<String>) -> Self {
        self.quantity = non_blank(quantity);
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = non_blank(note);
        self
    }
}

/// Body of `PUT /shopping/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemUpdate {
    pub quantity: Option<String>,
    pub note: Option<String>,
}

impl ItemUpdate {
    pub fn new(quantity: Option<String>, note: Option<String>) -> Self {
        Self {
            quantity: non_blank(quantity),
            note: non_blank(note),
        }
    }
}

/// How `POST /shopping/clear` treats unchecked entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Remove every entry
    All,
    /// Remove checked entries, keep the rest
    KeepUnchecked,
}

impl ClearMode {
    pub fn keep_unchecked(self) -> bool {
        matches!(self, ClearMode::KeepUnchecked)
    }
}
