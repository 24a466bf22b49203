//! Application-wide constants
//!
//! Centralized location for wire strings and timing values
//! that are used across multiple modules.

use std::time::Duration;

/// Default server base URL (the API lives under `/api`)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Prefix shared by every REST and stream endpoint
pub const API_PREFIX: &str = "/api";

/// Header carrying the household access key, on CRUD and stream requests
pub const ACCESS_KEY_HEADER: &str = "X-Access-Key";

/// Delay between a stream failure and the next connection attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Per-request timeout for CRUD calls (never applied to the stream)
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Fallback detail when a failed response carries no readable body
pub const UNKNOWN_ERROR_DETAIL: &str = "Unknown error";

/// Maximum number of product suggestions returned by a search
pub const SEARCH_RESULT_LIMIT: usize = 10;

// Endpoint paths, relative to API_PREFIX
pub mod paths {
    /// Server-push update stream
    pub const STREAM: &str = "/sse";
    /// Product catalog collection
    pub const PRODUCTS: &str = "/products";
    /// Bulk reorder of the catalog
    pub const PRODUCTS_REORDER: &str = "/products/reorder";
    /// Shopping list collection
    pub const SHOPPING: &str = "/shopping";
    /// Clear the shopping list
    pub const SHOPPING_CLEAR: &str = "/shopping/clear";
}

// Dirty-signal `type` values sent on the stream
pub mod topics {
    pub const PRODUCTS_UPDATED: &str = "products_updated";
    pub const SHOPPING_UPDATED: &str = "shopping_updated";
}
