use std::sync::Arc;

use api_types::report::AmountSummary;
use tokio::{sync::watch, task::JoinSet};

use crate::{
    api::ApiClient,
    categories::CategoryStore,
    config::AppConfig,
    currency::CurrencyStore,
    error::{Result, StoreError},
    language::LanguagePreference,
    session::{Identity, IdentityState, Session},
    storage::Storage,
    toast::Toasts,
    transactions::TransactionStore,
};

/// Every store of the client, built once and shared by `Arc`.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub api: ApiClient,
    pub storage: Arc<Storage>,
    pub toasts: Arc<Toasts>,
    pub session: Arc<Session>,
    pub currencies: Arc<CurrencyStore>,
    pub categories: Arc<CategoryStore>,
    pub transactions: Arc<TransactionStore>,
    pub language: Arc<LanguagePreference>,
}

impl AppContext {
    /// Loads persisted state from `config.state_path`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let storage = Storage::load(&config.state_path)?;
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: AppConfig, storage: Storage) -> Result<Self> {
        let api = ApiClient::new(&config.base_url)?;
        let storage = Arc::new(storage);
        let toasts = Arc::new(Toasts::new(config.toast_delay()));
        let session = Arc::new(Session::new(
            api.clone(),
            Arc::clone(&storage),
            Arc::clone(&toasts),
        ));

        Ok(Self {
            currencies: Arc::new(CurrencyStore::new(api.clone(), Arc::clone(&toasts))),
            categories: Arc::new(CategoryStore::new(
                api.clone(),
                Arc::clone(&session),
                Arc::clone(&toasts),
            )),
            transactions: Arc::new(TransactionStore::new(
                api.clone(),
                Arc::clone(&session),
                Arc::clone(&toasts),
            )),
            language: Arc::new(LanguagePreference::new(Arc::clone(&storage))),
            config,
            api,
            storage,
            toasts,
            session,
        })
    }

    /// Refetches (or clears) the session-scoped stores for `identity`.
    pub async fn sync_identity(&self, identity: Option<&Identity>) -> std::result::Result<(), StoreError> {
        let (categories, transactions) = tokio::join!(
            self.categories.on_identity(identity),
            self.transactions.on_identity(identity),
        );
        categories.and(transactions)
    }

    /// Follows session identity changes until the session is dropped.
    pub async fn run_identity_sync(&self) {
        self.follow_identities(self.session.subscribe()).await;
    }

    async fn follow_identities(&self, mut identities: watch::Receiver<IdentityState>) {
        while identities.changed().await.is_ok() {
            let identity = identities.borrow_and_update().identity.clone();
            match self.sync_identity(identity.as_ref()).await {
                Ok(()) | Err(StoreError::Cancelled) => {}
                Err(err) => tracing::warn!(error = %err, "identity sync failed"),
            }
        }
    }

    /// Starts identity sync and toast expiry. Dropping the set stops both.
    pub fn spawn_background(self: &Arc<Self>) -> JoinSet<()> {
        let mut tasks = JoinSet::new();
        // Subscribe now so a login racing the spawn is not missed.
        let identities = self.session.subscribe();
        let ctx = Arc::clone(self);
        tasks.spawn(async move { ctx.follow_identities(identities).await });
        let toasts = Arc::clone(&self.toasts);
        tasks.spawn(async move { toasts.run_expiry().await });
        tasks
    }

    /// Server-side totals; `None` without a session.
    pub async fn amount_summary(&self) -> std::result::Result<Option<AmountSummary>, StoreError> {
        let Some(token) = self.session.token() else {
            return Ok(None);
        };
        Ok(Some(self.api.amount_summary(&token).await?))
    }
}
