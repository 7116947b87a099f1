//! In-memory caches shared by the CRUD stores.
//!
//! A [`CrudStore`] owns its cache exclusively. Successful operations patch the
//! cache with the server's payload instead of refetching:
//!
//! - `add` appends the created entity;
//! - `update` merges the response fields over the cached object;
//! - `delete` filters the entity out;
//! - `fetch_all` replaces the whole cache.
//!
//! Every operation owns the shared `loading` flag and fires at most one toast.
//! Overlapping operations race on both; the last one to finish wins.
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    api::ApiClient,
    error::StoreError,
    session::{Identity, Session, Ticket},
    toast::Toasts,
};

/// Entity served by a REST collection under [`Resource::PATH`].
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type New: Serialize + Send + Sync;
    type Patch: Serialize + Send + Sync;

    const PATH: &'static str;
    /// Capitalised singular, used in toasts ("Category added successfully").
    const NOUN: &'static str;
    const PLURAL: &'static str;

    fn id(&self) -> &str;

    /// Client-side validation of a new entity; `Err` carries the message.
    fn check_new(_data: &Self::New) -> Result<(), String> {
        Ok(())
    }

    fn check_patch(_current: Option<&Self>, _patch: &Self::Patch) -> Result<(), String> {
        Ok(())
    }

    fn check_delete(_current: Option<&Self>) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug)]
struct CacheState<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
    loaded: bool,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            loaded: false,
        }
    }
}

/// Items plus the loading flag and last-error slot of one store.
#[derive(Debug)]
pub(crate) struct Cache<T> {
    state: RwLock<CacheState<T>>,
}

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
        }
    }
}

impl<T: Clone> Cache<T> {
    fn read(&self) -> RwLockReadGuard<'_, CacheState<T>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<T>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn begin(&self) {
        let mut state = self.write();
        state.loading = true;
        state.error = None;
    }

    pub(crate) fn succeed(&self, patch: impl FnOnce(&mut Vec<T>)) {
        let mut state = self.write();
        patch(&mut state.items);
        state.loading = false;
    }

    pub(crate) fn replace(&self, items: Vec<T>) {
        self.succeed(|cached| *cached = items);
        self.write().loaded = true;
    }

    pub(crate) fn fail(&self, message: String) {
        let mut state = self.write();
        state.loading = false;
        state.error = Some(message);
    }

    /// Ends an operation without touching items or the error slot.
    pub(crate) fn settle(&self) {
        self.write().loading = false;
    }

    pub(crate) fn clear(&self) {
        *self.write() = CacheState::default();
    }

    pub(crate) fn items(&self) -> Vec<T> {
        self.read().items.clone()
    }

    pub(crate) fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.read().items.iter().find(|item| pred(item)).cloned()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub(crate) fn clear_error(&self) {
        self.write().error = None;
    }
}

/// Shallow merge of `patch` over the JSON form of `current`.
///
/// Keys present in `patch` win, the rest of `current` is kept. A non-object
/// patch leaves `current` untouched.
pub fn merge_json<T: Serialize + DeserializeOwned>(
    current: &T,
    patch: Value,
) -> Result<T, serde_json::Error> {
    let mut base = serde_json::to_value(current)?;
    if let (Value::Object(base), Value::Object(patch)) = (&mut base, patch) {
        for (key, value) in patch {
            base.insert(key, value);
        }
    }
    serde_json::from_value(base)
}

/// Session-scoped CRUD cache over one REST collection.
#[derive(Debug)]
pub struct CrudStore<R: Resource> {
    api: ApiClient,
    session: Arc<Session>,
    toasts: Arc<Toasts>,
    cache: Cache<R>,
}

impl<R: Resource> CrudStore<R> {
    pub fn new(api: ApiClient, session: Arc<Session>, toasts: Arc<Toasts>) -> Self {
        Self {
            api,
            session,
            toasts,
            cache: Cache::default(),
        }
    }

    pub fn items(&self) -> Vec<R> {
        self.cache.items()
    }

    pub fn find(&self, id: &str) -> Option<R> {
        self.cache.find(|item| item.id() == id)
    }

    pub fn is_loading(&self) -> bool {
        self.cache.is_loading()
    }

    /// `true` once a fetch succeeded for the current identity.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    pub fn error(&self) -> Option<String> {
        self.cache.error()
    }

    pub fn clear_error(&self) {
        self.cache.clear_error();
    }

    /// Drops every cached entity, e.g. after logout.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Reacts to a published identity: refetch for a user, clear otherwise.
    pub async fn on_identity(&self, identity: Option<&Identity>) -> Result<(), StoreError> {
        match identity {
            Some(identity) => {
                tracing::debug!(resource = R::PLURAL, user_id = %identity.user_id, "identity changed, refetching");
                self.fetch_all().await
            }
            None => {
                self.clear();
                Ok(())
            }
        }
    }

    fn guard(&self, ticket: &Ticket) -> Result<(), StoreError> {
        if self.session.is_current(ticket) {
            return Ok(());
        }
        self.cache.settle();
        tracing::debug!(resource = R::PLURAL, "discarding result from a previous session");
        Err(StoreError::Cancelled)
    }

    fn fail(&self, err: StoreError, fallback: &str) -> StoreError {
        let message = err.user_message(fallback);
        tracing::warn!(resource = R::PLURAL, %message, "store operation failed");
        self.cache.fail(message.clone());
        self.toasts.error(message);
        err
    }

    /// Replaces the cache with the server's collection. No-op without a session.
    pub async fn fetch_all(&self) -> Result<(), StoreError> {
        let Some(ticket) = self.session.ticket() else {
            return Ok(());
        };

        self.cache.begin();
        let result = self.api.list::<R>(R::PATH, &ticket.token).await;
        self.guard(&ticket)?;

        match result {
            Ok(items) => {
                tracing::debug!(resource = R::PLURAL, count = items.len(), "cache refreshed");
                self.cache.replace(items);
                Ok(())
            }
            Err(err) => Err(self.fail(err.into(), &format!("Failed to fetch {}", R::PLURAL))),
        }
    }

    /// Creates an entity and appends the server's answer to the cache.
    ///
    /// Returns `Ok(None)` without a session.
    pub async fn add(&self, data: &R::New) -> Result<Option<R>, StoreError> {
        R::check_new(data).map_err(StoreError::Validation)?;
        let Some(ticket) = self.session.ticket() else {
            return Ok(None);
        };

        self.cache.begin();
        let result = self.api.create::<_, R>(R::PATH, data, &ticket.token).await;
        self.guard(&ticket)?;

        match result {
            Ok(created) => {
                self.cache.succeed(|items| items.push(created.clone()));
                self.toasts
                    .success(format!("{} added successfully", R::NOUN));
                Ok(Some(created))
            }
            Err(err) => Err(self.fail(
                err.into(),
                &format!("Failed to add {}", R::NOUN.to_lowercase()),
            )),
        }
    }

    /// Updates an entity and merges the server's answer over the cached one.
    ///
    /// Returns the merged entity, or `None` when it is no longer cached.
    pub async fn update(&self, id: &str, patch: &R::Patch) -> Result<Option<R>, StoreError> {
        R::check_patch(self.find(id).as_ref(), patch).map_err(StoreError::Validation)?;
        let Some(ticket) = self.session.ticket() else {
            return Ok(None);
        };

        self.cache.begin();
        let result = self.api.update(R::PATH, id, patch, &ticket.token).await;
        self.guard(&ticket)?;

        match result {
            Ok(payload) => {
                let mut updated = None;
                self.cache.succeed(|items| {
                    let Some(item) = items.iter_mut().find(|item| item.id() == id) else {
                        return;
                    };
                    if let Some(payload) = payload {
                        match merge_json(&*item, payload) {
                            Ok(merged) => *item = merged,
                            Err(err) => {
                                tracing::warn!(resource = R::PLURAL, id, error = %err, "update payload does not fit the cached entity");
                            }
                        }
                    }
                    updated = Some(item.clone());
                });
                self.toasts
                    .success(format!("{} updated successfully", R::NOUN));
                Ok(updated)
            }
            Err(err) => Err(self.fail(
                err.into(),
                &format!("Failed to update {}", R::NOUN.to_lowercase()),
            )),
        }
    }

    /// Deletes an entity and filters it out of the cache.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if let Err(message) = R::check_delete(self.find(id).as_ref()) {
            self.toasts.warning(message.clone());
            return Err(StoreError::Validation(message));
        }
        let Some(ticket) = self.session.ticket() else {
            return Ok(());
        };

        self.cache.begin();
        let result = self.api.delete(R::PATH, id, &ticket.token).await;
        self.guard(&ticket)?;

        match result {
            Ok(()) => {
                self.cache.succeed(|items| items.retain(|item| item.id() != id));
                self.toasts
                    .success(format!("{} deleted successfully", R::NOUN));
                Ok(())
            }
            Err(err) => Err(self.fail(
                err.into(),
                &format!("Failed to delete {}", R::NOUN.to_lowercase()),
            )),
        }
    }
}
