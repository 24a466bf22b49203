use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type ProductId = i64;

/// Catalog entry. `sort_order` is the dense aisle position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, sort_order: i64) -> Self {
        Self {
            id,
            name: name.into(),
            sort_order,
            created_at: None,
        }
    }
}

/// Trimmed product name, or None when nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_server_product() {
        let json = r#"{"id": 4, "name": "Mleko", "sort_order": 2, "created_at": "2024-05-01T10:15:30.123456"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 4);
        assert_eq!(product.name, "Mleko");
        assert_eq!(product.sort_order, 2);
        assert!(product.created_at.is_some());
    }

    #[test]
    fn test_created_at_is_optional() {
        let json = r#"{"id": 1, "name": "Chleb", "sort_order": 1}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.created_at.is_none());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Masło "), Some("Masło".to_string()));
        assert_eq!(normalize_name("   "), None);
        assert_eq!(normalize_name(""), None);
    }
}
