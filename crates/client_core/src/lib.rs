use std::sync::Arc;

use async_trait::async_trait;
use docstore::{CollectionSubscription, DocumentBackend, ListenerEvent, RawDocument};
use shared::{
    domain::{GroceryItem, ItemId, SortDirection, StoreFilter},
    error::{BackendError, WriteError},
};
use tokio::{
    sync::{broadcast::error::RecvError, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Maintains the live subscription to the remote grocery collection and
/// performs the write/delete operations. Keeps no cache of its own: every
/// locally visible change round-trips through a delivered snapshot, so the
/// client view always matches what the server currently has.
pub struct RemoteListStore {
    backend: Arc<dyn DocumentBackend>,
}

/// Cancellation handle for one live subscription. Dropping it also cancels,
/// tying teardown to the owning scope.
pub struct SubscriptionHandle {
    pump: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stops snapshot delivery. Idempotent; safe after the pump has already
    /// exited on its own.
    pub fn cancel(&self) {
        self.pump.abort();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl RemoteListStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self { backend }
    }

    /// Registers a listener with the remote collection and pumps every
    /// delivered membership — initial load first, then each change — through
    /// `on_snapshot` as a full decoded set. Malformed documents are dropped
    /// per record; listener errors are logged and swallowed, leaving the
    /// subscription nominally alive.
    pub async fn subscribe<F>(&self, on_snapshot: F) -> Result<SubscriptionHandle, BackendError>
    where
        F: Fn(Vec<GroceryItem>) + Send + Sync + 'static,
    {
        let CollectionSubscription {
            initial,
            mut events,
        } = self.backend.subscribe().await?;

        let pump = tokio::spawn(async move {
            on_snapshot(decode_membership(&initial));
            loop {
                match events.recv().await {
                    Ok(ListenerEvent::Snapshot(documents)) => {
                        on_snapshot(decode_membership(&documents));
                    }
                    Ok(ListenerEvent::Error(message)) => {
                        warn!("collection listener error, no snapshot for this event: {message}");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Every snapshot carries full membership, so skipped
                        // intermediates cost nothing once the next one lands.
                        warn!(skipped, "listener lagged behind the collection feed");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("collection listener feed closed, pump exiting");
        });

        Ok(SubscriptionHandle { pump })
    }

    /// Upsert keyed by the item's id. The snapshot listener, not this call,
    /// is what makes the item visible locally.
    pub async fn add(&self, item: &GroceryItem) -> Result<(), BackendError> {
        let data = serde_json::to_value(item)
            .map_err(|err| BackendError::Serialization(err.to_string()))?;
        self.backend.upsert(&item.id.0.to_string(), data).await
    }

    pub async fn remove(&self, id: ItemId) -> Result<(), BackendError> {
        self.backend.delete(&id.0.to_string()).await
    }
}

fn decode_membership(documents: &[RawDocument]) -> Vec<GroceryItem> {
    documents.iter().filter_map(decode_document).collect()
}

/// One malformed record must never kill the subscription: decode failures
/// drop that document from the delivered set and nothing else.
fn decode_document(document: &RawDocument) -> Option<GroceryItem> {
    match serde_json::from_value(document.data.clone()) {
        Ok(item) => Some(item),
        Err(err) => {
            warn!(key = %document.key, "dropping malformed grocery document: {err}");
            None
        }
    }
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Unattached,
    Attached,
    Detached,
}

struct ViewState {
    filter: StoreFilter,
    sort: SortDirection,
    lifecycle: Lifecycle,
    subscription: Option<SubscriptionHandle>,
}

/// Projects the raw item set into what the presentation layer renders and
/// translates user intents into store calls. The latest delivered snapshot
/// lives in a watch channel: concurrent deliveries replace it whole, last
/// write wins, never a merge.
pub struct ListViewModel {
    store: Arc<RemoteListStore>,
    snapshot: watch::Sender<Vec<GroceryItem>>,
    inner: Mutex<ViewState>,
}

impl ListViewModel {
    pub fn new(store: Arc<RemoteListStore>) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            store,
            snapshot,
            inner: Mutex::new(ViewState {
                filter: StoreFilter::All,
                sort: SortDirection::Ascending,
                lifecycle: Lifecycle::Unattached,
                subscription: None,
            }),
        }
    }

    /// Starts the remote subscription. A repeat call while attached is a
    /// no-op; Detached is terminal, so attaching after `detach` is ignored.
    pub async fn attach(&self) -> Result<(), BackendError> {
        let mut inner = self.inner.lock().await;
        match inner.lifecycle {
            Lifecycle::Attached => return Ok(()),
            Lifecycle::Detached => {
                warn!("attach ignored: view model is already detached");
                return Ok(());
            }
            Lifecycle::Unattached => {}
        }

        let snapshot = self.snapshot.clone();
        let subscription = self
            .store
            .subscribe(move |items| {
                snapshot.send_replace(items);
            })
            .await?;
        inner.subscription = Some(subscription);
        inner.lifecycle = Lifecycle::Attached;
        info!("grocery list view model attached");
        Ok(())
    }

    /// Terminal teardown: cancels the subscription so no further snapshots
    /// are delivered. Safe to call repeatedly and without a prior `attach`.
    pub async fn detach(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(subscription) = inner.subscription.take() {
            subscription.cancel();
        }
        if inner.lifecycle != Lifecycle::Detached {
            inner.lifecycle = Lifecycle::Detached;
            info!("grocery list view model detached");
        }
    }

    /// Latest snapshot sorted by name per the current direction, then
    /// filtered by the active store filter. Recomputed whole on every call,
    /// never patched incrementally.
    pub async fn current_items(&self) -> Vec<GroceryItem> {
        let inner = self.inner.lock().await;
        let mut items = self.snapshot.borrow().clone();
        match inner.sort {
            SortDirection::Ascending => items.sort_by(|a, b| a.name.cmp(&b.name)),
            SortDirection::Descending => items.sort_by(|a, b| b.name.cmp(&a.name)),
        }
        items.retain(|item| inner.filter.matches(item));
        items
    }

    pub async fn toggle_sort_direction(&self) -> SortDirection {
        let mut inner = self.inner.lock().await;
        inner.sort = inner.sort.toggled();
        inner.sort
    }

    pub async fn set_filter(&self, filter: StoreFilter) {
        self.inner.lock().await.filter = filter;
    }

    pub async fn sort_direction(&self) -> SortDirection {
        self.inner.lock().await.sort
    }

    pub async fn filter(&self) -> StoreFilter {
        self.inner.lock().await.filter.clone()
    }

    /// Validates, capitalizes the name, allocates `max(ids) + 1` from the
    /// latest snapshot and writes through the store. The snapshot itself is
    /// untouched: the item appears once the listener observes the
    /// server-confirmed write.
    pub async fn request_add(
        &self,
        name: &str,
        quantity: &str,
        store: &str,
    ) -> Result<ItemId, WriteError> {
        if name.is_empty() {
            return Err(WriteError::EmptyName);
        }
        if quantity.is_empty() {
            return Err(WriteError::EmptyQuantity);
        }

        let id = {
            let snapshot = self.snapshot.borrow();
            ItemId(snapshot.iter().map(|item| item.id.0).max().unwrap_or(0) + 1)
        };
        let item = GroceryItem {
            id,
            name: capitalize_first(name),
            quantity: quantity.to_string(),
            store: store.to_string(),
        };
        self.store.add(&item).await?;
        info!(id = id.0, name = %item.name, "grocery item write submitted");
        Ok(id)
    }

    pub async fn request_remove(&self, id: ItemId) -> Result<(), WriteError> {
        self.store.remove(id).await?;
        info!(id = id.0, "grocery item delete submitted");
        Ok(())
    }

    /// The observable snapshot: receivers wake on every delivered change.
    /// Projection (sort + filter) is applied on read via `current_items`.
    pub fn watch_items(&self) -> watch::Receiver<Vec<GroceryItem>> {
        self.snapshot.subscribe()
    }
}

/// The surface the presentation layer consumes; everything else in this
/// crate is an implementation detail behind it.
#[async_trait]
pub trait GroceryListHandle: Send + Sync {
    async fn attach(&self) -> Result<(), BackendError>;
    async fn detach(&self);
    async fn current_items(&self) -> Vec<GroceryItem>;
    async fn toggle_sort_direction(&self) -> SortDirection;
    async fn set_filter(&self, filter: StoreFilter);
    async fn request_add(
        &self,
        name: &str,
        quantity: &str,
        store: &str,
    ) -> Result<ItemId, WriteError>;
    async fn request_remove(&self, id: ItemId) -> Result<(), WriteError>;
    fn watch_items(&self) -> watch::Receiver<Vec<GroceryItem>>;
}

#[async_trait]
impl GroceryListHandle for ListViewModel {
    async fn attach(&self) -> Result<(), BackendError> {
        ListViewModel::attach(self).await
    }

    async fn detach(&self) {
        ListViewModel::detach(self).await
    }

    async fn current_items(&self) -> Vec<GroceryItem> {
        ListViewModel::current_items(self).await
    }

    async fn toggle_sort_direction(&self) -> SortDirection {
        ListViewModel::toggle_sort_direction(self).await
    }

    async fn set_filter(&self, filter: StoreFilter) {
        ListViewModel::set_filter(self, filter).await
    }

    async fn request_add(
        &self,
        name: &str,
        quantity: &str,
        store: &str,
    ) -> Result<ItemId, WriteError> {
        ListViewModel::request_add(self, name, quantity, store).await
    }

    async fn request_remove(&self, id: ItemId) -> Result<(), WriteError> {
        ListViewModel::request_remove(self, id).await
    }

    fn watch_items(&self) -> watch::Receiver<Vec<GroceryItem>> {
        ListViewModel::watch_items(self)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
