use std::sync::Arc;

use api_types::currency::Currency;

use crate::{api::ApiClient, error::StoreError, store::Cache, toast::Toasts};

/// Reference list of currencies. Public endpoint, no session needed.
#[derive(Debug)]
pub struct CurrencyStore {
    api: ApiClient,
    toasts: Arc<Toasts>,
    cache: Cache<Currency>,
}

impl CurrencyStore {
    pub fn new(api: ApiClient, toasts: Arc<Toasts>) -> Self {
        Self {
            api,
            toasts,
            cache: Cache::default(),
        }
    }

    pub fn items(&self) -> Vec<Currency> {
        self.cache.items()
    }

    pub fn find(&self, id: i64) -> Option<Currency> {
        self.cache.find(|currency| currency.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.cache.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.cache.error()
    }

    pub async fn fetch_all(&self) -> Result<(), StoreError> {
        self.cache.begin();
        match self.api.currencies().await {
            Ok(currencies) => {
                tracing::debug!(count = currencies.len(), "currencies loaded");
                self.cache.replace(currencies);
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                let message = err.user_message("Failed to fetch currencies");
                tracing::warn!(%message, "currency fetch failed");
                self.cache.fail(message.clone());
                self.toasts.error(message);
                Err(err)
            }
        }
    }

    /// Fetches once; later calls reuse the cache.
    pub async fn ensure_loaded(&self) -> Result<(), StoreError> {
        if self.cache.is_loaded() {
            return Ok(());
        }
        self.fetch_all().await
    }
}
