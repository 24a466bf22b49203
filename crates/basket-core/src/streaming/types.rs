use serde_json::Value;

use crate::constants::topics;

/// Collections a dirty signal can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ProductsChanged,
    ShoppingListChanged,
}

impl Topic {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            topics::PRODUCTS_UPDATED => Some(Topic::ProductsChanged),
            topics::SHOPPING_UPDATED => Some(Topic::ShoppingListChanged),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Topic::ProductsChanged => topics::PRODUCTS_UPDATED,
            Topic::ShoppingListChanged => topics::SHOPPING_UPDATED,
        }
    }
}

/// One decoded `data:` payload from the update stream.
/// Carries no delta; consumers refetch.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Raw JSON object as sent by the server
    pub message: Value,
}

impl StreamEvent {
    pub fn new(message: Value) -> Self {
        Self { message }
    }

    /// The `type` field, if present
    pub fn kind(&self) -> Option<&str> {
        self.message.get("type")?.as_str()
    }

    /// Known topic, or None for types this client does not understand
    pub fn topic(&self) -> Option<Topic> {
        self.kind().and_then(Topic::from_wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_extraction() {
        let event = StreamEvent::new(json!({"type": "products_updated", "data": {}}));
        assert_eq!(event.topic(), Some(Topic::ProductsChanged));

        let event = StreamEvent::new(json!({"type": "shopping_updated"}));
        assert_eq!(event.topic(), Some(Topic::ShoppingListChanged));
    }

    #[test]
    fn test_unknown_type_has_no_topic() {
        let event = StreamEvent::new(json!({"type": "household_renamed"}));
        assert_eq!(event.kind(), Some("household_renamed"));
        assert_eq!(event.topic(), None);

        // The server greets with {"status": "connected"}
        let event = StreamEvent::new(json!({"status": "connected"}));
        assert_eq!(event.kind(), None);
        assert_eq!(event.topic(), None);
    }

    #[test]
    fn test_wire_names_round_trip() {
        for topic in [Topic::ProductsChanged, Topic::ShoppingListChanged] {
            assert_eq!(Topic::from_wire(topic.as_wire()), Some(topic));
        }
    }
}
