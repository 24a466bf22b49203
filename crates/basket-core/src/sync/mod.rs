//! Reconciliation of server data with local optimistic edits.

mod coordinator;
mod error;
mod overlay;
mod replica;

pub use coordinator::{BulkToggle, Coordinator};
pub use error::SyncError;
pub use overlay::{Overlay, PendingEdit};
pub use replica::Snapshot;
