//! Client core for a household shopping list kept in sync with its server.
//!
//! [`streaming::StreamManager`] keeps one update stream open and turns its
//! `data:` lines into events. [`sync::Coordinator`] refetches on every
//! change signal and serves ordered views with local edits layered on top.
//! [`runtime::CoreRuntime`] wires both to a [`session::Session`].

pub mod api;
pub mod config;
pub mod constants;
pub mod models;
pub mod ordering;
pub mod runtime;
pub mod session;
pub mod streaming;
pub mod sync;
pub mod tracing_setup;

pub use api::{ApiError, HttpApi, ShoppingApi};
pub use config::CoreConfig;
pub use runtime::{CoreRuntime, RuntimeError};
pub use session::{Session, SessionState};
pub use streaming::{StreamEvent, StreamManager, StreamState, Topic};
pub use sync::{BulkToggle, Coordinator, Snapshot, SyncError};
