//! State and aggregation layer of the Pocketbook personal finance client.
//!
//! Stores wrap the finance REST API and keep session-scoped caches of
//! categories and transactions; [`reports`] and [`money`] derive everything
//! the user sees from those caches.
pub mod api;
pub mod categories;
pub mod config;
pub mod context;
pub mod currency;
pub mod error;
pub mod language;
pub mod money;
pub mod reports;
pub mod session;
pub mod storage;
pub mod store;
pub mod toast;
pub mod transactions;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use categories::CategoryStore;
pub use crate::config::{AppConfig, ConfigOverrides};
pub use context::AppContext;
pub use currency::CurrencyStore;
pub use error::{AppError, Result, StorageError, StoreError};
pub use language::{Language, LanguagePreference};
pub use session::Session;
pub use storage::Storage;
pub use toast::{Toast, ToastKind, Toasts};
pub use transactions::TransactionStore;
