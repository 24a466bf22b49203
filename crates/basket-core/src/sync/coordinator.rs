//! Keeps the local working copy in step with the server.
//!
//! Data flows one way: stream events mark the data dirty, a refresh
//! refetches both collections, and the pair is swapped in as a whole. Local
//! edits never touch the confirmed snapshot; they sit in the [`Overlay`]
//! until the next successful refresh clears it.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::SyncError;
use super::overlay::Overlay;
use super::replica::Snapshot;
use crate::api::{ApiError, ShoppingApi};
use crate::models::{
    normalize_name, ClearMode, ItemId, ItemUpdate, NewItem, Product, ProductId, ShoppingItem,
};
use crate::ordering::{self, Progress};
use crate::streaming::{StreamEvent, Topic};

/// Outcome of toggling a product from the bulk-add view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkToggle {
    Added(ShoppingItem),
    Removed(ItemId),
}

#[derive(Debug, Default)]
struct RefreshFlags {
    running: bool,
    /// Another request arrived while running
    pending: bool,
}

struct Shared {
    api: Arc<dyn ShoppingApi>,
    replica: RwLock<Arc<Snapshot>>,
    overlay: Mutex<Overlay>,
    flags: Mutex<RefreshFlags>,
    /// Serializes fetches so at most one refresh is in flight
    fetch_lock: tokio::sync::Mutex<()>,
    changes_tx: watch::Sender<u64>,
    cancel: CancellationToken,
}

#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Shared>,
}

impl Coordinator {
    pub fn new(api: Arc<dyn ShoppingApi>) -> Self {
        let (changes_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Shared {
                api,
                replica: RwLock::new(Arc::new(Snapshot::default())),
                overlay: Mutex::new(Overlay::new()),
                flags: Mutex::new(RefreshFlags::default()),
                fetch_lock: tokio::sync::Mutex::new(()),
                changes_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ===== Events =====

    /// React to one stream event. Returns the topic that triggered a
    /// refresh, or None when the event was ignored.
    pub fn handle_event(&self, event: &StreamEvent) -> Option<Topic> {
        let Some(topic) = event.topic() else {
            debug!(kind = ?event.kind(), "ignoring stream event");
            return None;
        };
        debug!(topic = topic.as_wire(), "server data changed");
        self.request_refresh();
        Some(topic)
    }

    /// Callback suitable for [`crate::streaming::StreamManager::new`].
    pub fn event_handler(&self) -> impl Fn(StreamEvent) + Send + Sync + 'static {
        let coordinator = self.clone();
        move |event| {
            coordinator.handle_event(&event);
        }
    }

    // ===== Refresh =====

    /// Fetch both collections now and swap them in. Waits for any refresh
    /// already in flight to finish first.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.inner.refresh().await
    }

    /// Schedule a background refresh. Requests made while one is running
    /// collapse into a single trailing refresh.
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_refresh(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        {
            let mut flags = self.inner.flags.lock();
            if flags.running {
                flags.pending = true;
                debug!("refresh already running, coalescing");
                return;
            }
            flags.running = true;
        }
        tokio::spawn(self.inner.clone().run_refreshes());
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.flags.lock().running
    }

    /// Stop background refreshes. Requests made afterwards are ignored.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ===== Views =====

    /// Last confirmed server state, without local edits.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.replica.read().clone()
    }

    /// Bumped whenever what the views return may have changed.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.inner.changes_tx.subscribe()
    }

    pub fn plain_list(&self) -> Vec<ShoppingItem> {
        let mut items = self.inner.view_items();
        ordering::sort_plain(&mut items);
        items
    }

    pub fn shopping_mode(&self) -> Vec<ShoppingItem> {
        let mut items = self.inner.view_items();
        ordering::sort_shopping_mode(&mut items);
        items
    }

    pub fn catalog(&self) -> Vec<Product> {
        let overlay = self.inner.overlay.lock();
        let snapshot = self.snapshot();
        overlay.apply_products(&snapshot.products)
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.inner.view_items())
    }

    /// Products matching `query` that are not on the list yet
    pub fn search(&self, query: &str) -> Vec<Product> {
        // Catalog and list must come from the same snapshot
        let (catalog, snapshot) = {
            let overlay = self.inner.overlay.lock();
            let snapshot = self.snapshot();
            (overlay.apply_products(&snapshot.products), snapshot)
        };
        ordering::search_products(&catalog, &snapshot.items, query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn find_product(&self, name: &str) -> Option<Product> {
        ordering::exact_match(&self.catalog(), name).cloned()
    }

    // ===== Catalog mutations =====

    pub async fn create_product(&self, name: &str) -> Result<Product, SyncError> {
        let name = normalize_name(name).ok_or(SyncError::EmptyName)?;
        let product = self.inner.api.create_product(&name).await?;
        info!(id = product.id, "product created");
        self.request_refresh();
        Ok(product)
    }

    pub async fn rename_product(&self, id: ProductId, name: &str) -> Result<Product, SyncError> {
        let name = normalize_name(name).ok_or(SyncError::EmptyName)?;
        let product = self.inner.api.rename_product(id, &name).await?;
        self.request_refresh();
        Ok(product)
    }

    /// Refused locally while any list entry references the product.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), SyncError> {
        let snapshot = self.snapshot();
        if let Some(entry) = snapshot.entry_for_product(id) {
            return Err(SyncError::ProductInUse {
                id,
                name: entry.display_name().to_string(),
            });
        }

        self.inner.api.delete_product(id).await?;
        info!(id, "product deleted");
        self.request_refresh();
        Ok(())
    }

    /// Submit a full ordering. The catalog view shows it immediately and
    /// falls back to the confirmed order if the server rejects it.
    pub async fn reorder_products(&self, order: &[ProductId]) -> Result<Vec<Product>, SyncError> {
        self.inner.overlay.lock().record_product_order(order.to_vec());
        self.inner.notify();

        match self.inner.api.reorder_products(order).await {
            Ok(products) => {
                self.request_refresh();
                Ok(products)
            }
            Err(e) => {
                warn!(error = %e, "reorder rejected, restoring confirmed order");
                self.inner.overlay.lock().discard_product_order();
                self.inner.notify();
                self.request_refresh();
                Err(e.into())
            }
        }
    }

    /// Move one product to `to_index` in the catalog (clamped to the end).
    pub async fn move_product(
        &self,
        id: ProductId,
        to_index: usize,
    ) -> Result<Vec<Product>, SyncError> {
        let order: Vec<ProductId> = self.catalog().iter().map(|p| p.id).collect();
        let from = order
            .iter()
            .position(|p| *p == id)
            .ok_or(SyncError::UnknownProduct(id))?;
        let to = to_index.min(order.len() - 1);
        self.reorder_products(&ordering::move_id(&order, from, to))
            .await
    }

    // ===== List mutations =====

    pub async fn add_item(&self, item: NewItem) -> Result<ShoppingItem, SyncError> {
        let item = self.inner.api.add_item(&item).await?;
        info!(id = item.id, name = item.display_name(), "added to list");
        self.request_refresh();
        Ok(item)
    }

    pub async fn update_item(
        &self,
        id: ItemId,
        update: ItemUpdate,
    ) -> Result<ShoppingItem, SyncError> {
        self.inner.overlay.lock().record_update(id, &update);
        self.inner.notify();

        let result = self.inner.api.update_item(id, &update).await;
        self.settle_edit(id, result, |overlay| overlay.discard_update(id, &update))
    }

    pub async fn set_checked(&self, id: ItemId, is_checked: bool) -> Result<ShoppingItem, SyncError> {
        self.inner.overlay.lock().record_checked(id, is_checked);
        self.inner.notify();

        let result = self.inner.api.set_checked(id, is_checked).await;
        self.settle_edit(id, result, |overlay| overlay.discard_checked(id))
    }

    /// Flip the checked state as currently displayed.
    pub async fn toggle_checked(&self, id: ItemId) -> Result<ShoppingItem, SyncError> {
        let current = self
            .inner
            .view_items()
            .into_iter()
            .find(|i| i.id == id)
            .ok_or(SyncError::UnknownItem(id))?;
        self.set_checked(id, !current.is_checked).await
    }

    pub async fn delete_item(&self, id: ItemId) -> Result<(), SyncError> {
        self.inner.api.delete_item(id).await?;
        self.request_refresh();
        Ok(())
    }

    pub async fn clear_list(&self, mode: ClearMode) -> Result<(), SyncError> {
        self.inner.api.clear_list(mode).await?;
        info!(keep_unchecked = mode.keep_unchecked(), "list cleared");
        self.request_refresh();
        Ok(())
    }

    /// Bulk-add view: take the product off the list if it is on it,
    /// otherwise add it.
    pub async fn toggle_product_on_list(
        &self,
        product_id: ProductId,
        quantity: Option<String>,
    ) -> Result<BulkToggle, SyncError> {
        let snapshot = self.snapshot();
        if let Some(entry) = snapshot.entry_for_product(product_id) {
            let id = entry.id;
            self.delete_item(id).await?;
            return Ok(BulkToggle::Removed(id));
        }
        if snapshot.product(product_id).is_none() {
            return Err(SyncError::UnknownProduct(product_id));
        }

        let item = self
            .add_item(NewItem::from_product(product_id).with_quantity(quantity))
            .await?;
        Ok(BulkToggle::Added(item))
    }

    /// Revert the fields of a rejected edit and resync.
    fn settle_edit(
        &self,
        id: ItemId,
        result: Result<ShoppingItem, ApiError>,
        revert: impl FnOnce(&mut Overlay) -> bool,
    ) -> Result<ShoppingItem, SyncError> {
        match result {
            Ok(item) => {
                self.request_refresh();
                Ok(item)
            }
            Err(e) => {
                warn!(id, error = %e, "edit rejected, discarding local change");
                revert(&mut *self.inner.overlay.lock());
                self.inner.notify();
                self.request_refresh();
                Err(e.into())
            }
        }
    }
}

impl Shared {
    fn notify(&self) {
        self.changes_tx.send_modify(|revision| *revision += 1);
    }

    fn view_items(&self) -> Vec<ShoppingItem> {
        let overlay = self.overlay.lock();
        let snapshot = self.replica.read().clone();
        overlay.apply_items(&snapshot.items, &snapshot.products)
    }

    async fn refresh(&self) -> Result<(), SyncError> {
        let _fetching = self.fetch_lock.lock().await;

        let (mut products, items) =
            tokio::try_join!(self.api.fetch_products(), self.api.fetch_shopping_list())?;
        ordering::sort_catalog(&mut products);

        // Overlay first, then replica: same order as the views.
        let mut overlay = self.overlay.lock();
        let version = {
            let mut replica = self.replica.write();
            let version = replica.version + 1;
            *replica = Arc::new(Snapshot {
                products,
                items,
                version,
            });
            version
        };
        overlay.clear();
        drop(overlay);

        debug!(version, "replica refreshed");
        self.notify();
        Ok(())
    }

    async fn run_refreshes(self: Arc<Self>) {
        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.flags.lock().running = false;
                    return;
                }
                result = self.refresh() => result,
            };
            if let Err(e) = result {
                warn!(error = %e, "background refresh failed");
            }

            let again = {
                let mut flags = self.flags.lock();
                if flags.pending {
                    flags.pending = false;
                    true
                } else {
                    flags.running = false;
                    false
                }
            };
            if !again {
                return;
            }
        }
    }
}
