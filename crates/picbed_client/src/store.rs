use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::SelectError;
use crate::http::{ApiClient, HttpTransport};
use crate::select::{IntoSelection, MappedState};
use crate::state::{is_truthy, GlobalState};
use crate::storage::PersistedStorage;

/// Storage key holding the persisted state snapshot.
pub const STATE_STORAGE_KEY: &str = "picbed-global-state";

/// Path of the public site configuration endpoint, relative to the API base.
pub const CONFIG_PATH: &str = "/spa";

/// A single field write observed by subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct StateChange {
    /// Wire name of the field (`isLogin`, `site_name`, ...)
    pub key: String,
    /// Value after the write
    pub value: Value,
}

/// Handle returned by [`Store::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&StateChange) + Send + Sync>;

struct StoreInner {
    state: GlobalState,
    storage: PersistedStorage,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription_id: u64,
}

/// The global store: one live [`GlobalState`] plus its mutations and actions.
///
/// Cloning a `Store` clones the handle, never the state. Every write that
/// changes a field is reported to subscribers with a [`StateChange`].
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
}

impl Store {
    /// Store seeded from `picbed-global-state` in browser storage.
    pub fn new() -> Self {
        Self::with_storage(PersistedStorage::new(STATE_STORAGE_KEY))
    }

    /// Store seeded from (and persisting to) `storage`.
    pub fn with_storage(storage: PersistedStorage) -> Self {
        let state = GlobalState::from_snapshot(storage.get());
        log::debug!(
            "[Store] Initialized (isLogin={}, storage available={})",
            state.is_login,
            storage.is_available()
        );
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                state,
                storage,
                subscribers: Vec::new(),
                next_subscription_id: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles point at the same live state.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run `f` against a copy of the current state.
    ///
    /// The lock is released before `f` runs, so `f` may use the store.
    pub fn with_state<R>(&self, f: impl FnOnce(&GlobalState) -> R) -> R {
        let state = self.snapshot();
        f(&state)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> GlobalState {
        self.lock().state.clone()
    }

    /// Current value of one field (`Value::Null` if it was never written).
    pub fn field(&self, key: &str) -> Value {
        self.lock().state.field(key)
    }

    pub fn is_login(&self) -> bool {
        self.lock().state.is_login
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Register `f` to be called after every field change.
    pub fn subscribe(&self, f: impl Fn(&StateChange) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_subscription_id);
        inner.next_subscription_id += 1;
        inner.subscribers.push((id, Arc::new(f)));
        id
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Apply `f` under the lock, then notify subscribers of whatever changed.
    ///
    /// Subscribers run after the lock is released so they can read the store.
    fn write(&self, f: impl FnOnce(&mut GlobalState, &mut Vec<StateChange>)) {
        let (changes, subscribers) = {
            let mut inner = self.lock();
            let mut changes = Vec::new();
            f(&mut inner.state, &mut changes);
            if changes.is_empty() {
                return;
            }
            let subscribers: Vec<Subscriber> =
                inner.subscribers.iter().map(|(_, s)| s.clone()).collect();
            (changes, subscribers)
        };
        for change in &changes {
            for subscriber in &subscribers {
                subscriber(change);
            }
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Write one field. Known fields are type checked; a rejected value is
    /// logged and the field keeps its current value.
    pub fn set_field(&self, key: &str, value: Value) {
        self.write(|state, changes| assign_into(state, changes, key, value));
    }

    /// Mark the session as logged in.
    pub fn set_login(&self, session_id: impl Into<String>) {
        let session_id = session_id.into();
        self.write(|state, changes| {
            assign_into(state, changes, "isLogin", Value::Bool(true));
            assign_into(state, changes, "sessionId", Value::String(session_id));
        });
    }

    /// Mark the session as logged out.
    ///
    /// `sessionId` is left as it was.
    pub fn clear_login(&self) {
        self.set_field("isLogin", Value::Bool(false));
    }

    /// Set `isLogin` to the truthiness of `v`.
    pub fn update_login(&self, v: impl Into<Value>) {
        let flag = is_truthy(&v.into());
        self.set_field("isLogin", Value::Bool(flag));
    }

    /// Flip `isLogin`.
    pub fn change_login(&self) {
        self.write(|state, changes| {
            let next = !state.is_login;
            assign_into(state, changes, "isLogin", Value::Bool(next));
        });
    }

    /// Write the current state to the persisted snapshot.
    pub fn persist(&self) -> bool {
        let inner = self.lock();
        inner.storage.set(&inner.state)
    }

    /// Drop the persisted snapshot. The live state is untouched.
    pub fn clear_persisted(&self) -> bool {
        self.lock().storage.clear()
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Fetch the public site configuration and merge it into the state.
    ///
    /// Keys are merged in response order. Unknown keys are stored as-is; known
    /// fields are type checked, so a mistyped value is logged and skipped and
    /// `null` resets the field to its default. Failures are logged and leave
    /// the state as it was.
    pub async fn fetch_config<T: HttpTransport>(&self, api: &ApiClient<T>) {
        // TODO: surface fetch failures to the page once there is a toast/notice component.
        let body = match api.get_json(CONFIG_PATH).await {
            Ok(body) => body,
            Err(e) => {
                log::error!("[Store::fetch_config] {}", e);
                return;
            }
        };
        let map = match body {
            Value::Object(map) => map,
            other => {
                log::error!("[Store::fetch_config] Expected a JSON object, got: {}", other);
                return;
            }
        };
        log::debug!("[Store::fetch_config] Merging {} keys", map.len());
        self.write(|state, changes| {
            for (key, value) in map {
                assign_into(state, changes, &key, value);
            }
        });
    }

    // ========================================================================
    // Field selection
    // ========================================================================

    /// Build named accessors over the live state.
    ///
    /// See [`Selection`](crate::Selection) for the accepted shapes.
    pub fn map_state<C>(&self, selection: impl IntoSelection<C>) -> Result<MappedState<C>, SelectError> {
        let selection = selection.into_selection()?;
        Ok(MappedState::new(self.clone(), selection))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Store")
            .field("state", &inner.state)
            .field("storage", &inner.storage)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

fn assign_into(state: &mut GlobalState, changes: &mut Vec<StateChange>, key: &str, value: Value) {
    match state.assign(key, value) {
        Ok(true) => changes.push(StateChange {
            key: key.to_string(),
            value: state.field(key),
        }),
        Ok(false) => {}
        Err(e) => log::warn!("[Store] Rejected write: {}", e),
    }
}
