//! The todo store: single owner of the local todo collection.
//!
//! # Design
//! The store holds the authoritative in-memory copy of the collection, a
//! count of operations in flight and the last recorded failure. Only the five
//! operations (`load`, `create_todo`, `update_todo`, `delete_todo`,
//! `toggle_complete`) mutate it; everything else reads.
//!
//! Every remote operation follows the same sequence: raise `loading`, issue
//! the request, then on settle either apply the local mutation or record the
//! error, then lower `loading` and notify listeners. Local state changes only
//! after the server answered (pessimistic), and each operation either fully
//! applies its mutation or applies none.
//!
//! Operations are not serialized against each other. Two updates racing on the
//! same id both reach the server and whichever settles last overwrites the
//! local item. Derived views (`active_todos`, `completed_todos`, `count`) are
//! recomputed from the collection on every call.
//!
//! No lock is held across an `.await` or while listeners run, so a listener
//! may read the store it is subscribed to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::client::TodoClient;
use crate::config::StoreConfig;
use crate::error::{ApiError, StoreError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{validate_message, CreateTodo, Todo, TodoId, UpdateTodo};

/// Callback invoked with a fresh snapshot whenever store state changes.
pub type Listener = Arc<dyn Fn(&StoreSnapshot) + Send + Sync>;

/// Handle returned by `TodoStore::subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Point-in-time copy of the observable store state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub items: Vec<Todo>,
    pub loading: bool,
    pub error: Option<StoreError>,
}

impl StoreSnapshot {
    pub fn active_todos(&self) -> Vec<&Todo> {
        self.items.iter().filter(|t| !t.completed).collect()
    }

    pub fn completed_todos(&self) -> Vec<&Todo> {
        self.items.iter().filter(|t| t.completed).collect()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    items: Vec<Todo>,
    in_flight: usize,
    last_error: Option<StoreError>,
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            items: self.items.clone(),
            loading: self.in_flight > 0,
            error: self.last_error.clone(),
        }
    }

    /// Append, or replace in place if the id is already present.
    fn upsert(&mut self, todo: Todo) {
        match self.items.iter_mut().find(|t| t.id == todo.id) {
            Some(slot) => *slot = todo,
            None => self.items.push(todo),
        }
    }

    fn replace(&mut self, id: TodoId, todo: Todo) -> bool {
        match self.items.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                *slot = todo;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: TodoId) -> usize {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        before - self.items.len()
    }
}

/// Reactive todo store backed by a remote CRUD service.
///
/// Owned by the application's composition root and shared by reference.
pub struct TodoStore<T = ReqwestTransport> {
    client: TodoClient,
    transport: T,
    state: RwLock<StoreState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

/// Marks one operation as in flight; lowers `loading` and notifies on drop,
/// including when the operation future is dropped before settling.
struct InFlight<'a, T> {
    store: &'a TodoStore<T>,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        {
            let mut state = self.store.write();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        if !std::thread::panicking() {
            self.store.notify();
        }
    }
}

impl<T> TodoStore<T> {
    /// Create an empty, idle store. No request is issued.
    pub fn new(config: StoreConfig, transport: T) -> Self {
        let client = TodoClient::new(&config.base_url);
        info!(base_url = client.base_url(), "todo store initialized");
        Self {
            client,
            transport,
            state: RwLock::new(StoreState::default()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn items(&self) -> Vec<Todo> {
        self.read().items.clone()
    }

    pub fn loading(&self) -> bool {
        self.read().in_flight > 0
    }

    pub fn error(&self) -> Option<StoreError> {
        self.read().last_error.clone()
    }

    pub fn active_todos(&self) -> Vec<Todo> {
        self.read().items.iter().filter(|t| !t.completed).cloned().collect()
    }

    pub fn completed_todos(&self) -> Vec<Todo> {
        self.read().items.iter().filter(|t| t.completed).cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.read().items.len()
    }

    pub fn get(&self, id: TodoId) -> Option<Todo> {
        self.read().items.iter().find(|t| t.id == id).cloned()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.read().snapshot()
    }

    /// Register `listener`. It is called synchronously when an operation
    /// starts and again after it settles, whether it succeeded or failed.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let snapshot = self.snapshot();
        let listeners: Vec<Listener> = self.listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn begin(&self) -> InFlight<'_, T> {
        {
            let mut state = self.write();
            state.in_flight += 1;
            state.last_error = None;
        }
        self.notify();
        InFlight { store: self }
    }

    fn record(&self, err: StoreError) -> StoreError {
        warn!(error = %err, "todo operation failed");
        self.write().last_error = Some(err.clone());
        err
    }
}

impl<T: Transport> TodoStore<T> {
    /// Create a store and immediately load the collection. A failed initial
    /// load is recorded in `error()` and leaves the store empty.
    pub async fn open(config: StoreConfig, transport: T) -> Self {
        let store = Self::new(config, transport);
        if store.load().await.is_err() {
            debug!("initial load failed, starting empty");
        }
        store
    }

    async fn send<R>(
        &self,
        request: Result<HttpRequest, ApiError>,
        parse: impl FnOnce(&TodoClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let request = request?;
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.execute(request).await?;
        parse(&self.client, response)
    }

    /// Replace the local collection with the server's.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<(), StoreError> {
        let _flight = self.begin();
        let result = self
            .send(Ok(self.client.build_list_todos()), TodoClient::parse_list_todos)
            .await;
        match result {
            Ok(todos) => {
                info!(count = todos.len(), "todos loaded");
                self.write().items = todos;
                Ok(())
            }
            Err(source) => Err(self.record(StoreError::LoadFailed {
                url: self.client.base_url().to_string(),
                source,
            })),
        }
    }

    /// Create a todo and append the server's copy once it has an id.
    ///
    /// Blank or over-long messages are rejected without a request. A 2xx reply
    /// without an item settles as `Ok(None)` and leaves the collection as is.
    #[tracing::instrument(skip(self))]
    pub async fn create_todo(&self, message: &str) -> Result<Option<Todo>, StoreError> {
        let message = validate_message(message)?;
        let payload = CreateTodo::new(message);

        let _flight = self.begin();
        let result = self
            .send(self.client.build_create_todo(&payload), TodoClient::parse_create_todo)
            .await;
        match result {
            Ok(Some(todo)) => {
                info!(id = todo.id, "todo created");
                self.write().upsert(todo.clone());
                Ok(Some(todo))
            }
            Ok(None) => {
                warn!("create accepted without an item in the reply");
                Ok(None)
            }
            Err(source) => Err(self.record(StoreError::CreateFailed { payload, source })),
        }
    }

    /// Apply `patch` remotely and replace the local item with the server's
    /// representation. Fields the server omits are not kept from the old item.
    /// A 2xx reply without an item settles as `Ok(None)` and keeps the local copy.
    #[tracing::instrument(skip(self))]
    pub async fn update_todo(&self, id: TodoId, patch: UpdateTodo) -> Result<Option<Todo>, StoreError> {
        let patch = match patch.message {
            Some(ref raw) => UpdateTodo {
                message: Some(validate_message(raw)?),
                completed: patch.completed,
            },
            None => patch,
        };

        let _flight = self.begin();
        let result = self
            .send(self.client.build_update_todo(id, &patch), TodoClient::parse_update_todo)
            .await;
        match result {
            Ok(Some(todo)) => {
                if self.write().replace(id, todo.clone()) {
                    info!(id, "todo updated");
                } else {
                    debug!(id, "updated todo no longer present locally");
                }
                Ok(Some(todo))
            }
            Ok(None) => {
                warn!(id, "update accepted without an item in the reply");
                Ok(None)
            }
            Err(source) => Err(self.record(StoreError::UpdateFailed { id, patch, source })),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_todo(&self, id: TodoId) -> Result<(), StoreError> {
        let _flight = self.begin();
        let result = self
            .send(Ok(self.client.build_delete_todo(id)), TodoClient::parse_delete_todo)
            .await;
        match result {
            Ok(()) => {
                let removed = self.write().remove(id);
                info!(id, removed, "todo deleted");
                Ok(())
            }
            Err(source) => Err(self.record(StoreError::DeleteFailed { id, source })),
        }
    }

    /// Flip `completed` on a locally known todo.
    ///
    /// Returns `Ok(None)` without contacting the server when `id` is not in the
    /// current collection; state, including `error()`, is left untouched. Also
    /// `Ok(None)` when the server accepted the update but sent no item back.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_complete(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let Some(current) = self.get(id) else {
            debug!(id, "toggle skipped, todo not present");
            return Ok(None);
        };
        self.update_todo(id, UpdateTodo::completed(!current.completed))
            .await
    }
}
