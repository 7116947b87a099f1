//! Wire types of the finance REST API.
//!
//! Field names are camelCase on the wire; every type derives both `Serialize`
//! and `Deserialize` so the same definitions serve the client and test servers.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error body carried by non-2xx responses.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

pub mod currency {
    use super::*;

    /// Reference currency, loaded once and never mutated by the client.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Currency {
        pub id: i64,
        /// ISO 4217 code, e.g. `EUR`.
        pub currency: String,
        pub country: String,
        /// Locale tag used for formatting, e.g. `es-CO`.
        pub country_id: String,
    }
}

pub mod auth {
    use super::*;
    use crate::currency::Currency;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub id: String,
        pub name: String,
        pub email: String,
        #[serde(default)]
        pub verified: bool,
        pub currency_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub currency: Option<Currency>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RegisterRequest {
        pub name: String,
        pub email: String,
        pub password: String,
        pub currency_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    /// Response of both `/auth/login` and `/auth/register`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub user: User,
        pub token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct VerifyRequest {
        pub email: String,
        /// Six digit code sent by email, numeric on the wire.
        pub code: u32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResendCodeRequest {
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UpdateUserRequest {
        pub currency_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ChangePasswordRequest {
        pub new_password: String,
    }
}

pub mod category {
    use super::*;

    /// Spending or income bucket.
    ///
    /// System defaults have no `user_id` and are not `editable`: their name
    /// is locked and they cannot be deleted, but the icon may change.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Category {
        pub id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub user_id: Option<String>,
        pub name: String,
        pub icon: String,
        #[serde(default)]
        pub editable: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub icon: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub icon: Option<String>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TransactionType {
        Income,
        Expense,
    }

    impl TransactionType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
            }
        }
    }

    /// Category summary the server may embed in a transaction.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryRef {
        pub id: String,
        pub name: String,
        pub icon: String,
    }

    /// Ledger entry. `amount` is always positive; the sign lives in `kind`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: String,
        pub user_id: String,
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub desc: Option<String>,
        pub category_id: String,
        /// Assigned by the server.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub created_at: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<CategoryRef>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub desc: Option<String>,
        pub category_id: String,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub desc: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category_id: Option<String>,
    }
}

pub mod report {
    use super::*;

    /// Server-side totals shown on the dashboard.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AmountSummary {
        pub total_income: f64,
        pub total_expense: f64,
        pub total: f64,
    }
}
