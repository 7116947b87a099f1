use api_types::{
    ErrorBody,
    auth::{
        AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, ResendCodeRequest,
        UpdateUserRequest, User, VerifyRequest,
    },
    currency::Currency,
    report::AmountSummary,
};
use reqwest::{Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::AppError;

const FALLBACK_MESSAGE: &str = "An error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx response; `message` is the body's `message` field.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    #[error("empty response body")]
    EmptyBody,
}

impl ApiError {
    /// Text surfaced verbatim to the user.
    pub fn message(&self) -> String {
        match self {
            Self::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}

/// JSON client for the finance REST API.
///
/// Requests carry `Authorization: Bearer <token>` when a token is given.
/// There is no retry and no timeout: every failure is returned to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Url::parse(base_url).map_err(|err| AppError::BaseUrl(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|err| ApiError::InvalidUrl(err.to_string()))
    }

    fn item_url(&self, path: &str, id: &str) -> Result<Url, ApiError> {
        let mut url = self.url(path)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("cannot append id to {path}")))?
            .push(id);
        Ok(url)
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        tracing::debug!(%method, path = url.path(), "api request");

        let mut req = self.http.request(method.clone(), url.clone());
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let message = res
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        tracing::warn!(%method, path = url.path(), %status, %message, "api request failed");
        Err(ApiError::Server { status, message })
    }

    /// Sends a request and decodes the JSON body; `None` on 204.
    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<Option<T>, ApiError> {
        let res = self.execute(method, url, body, token).await?;
        if res.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(res.json::<T>().await?))
    }

    /// Sends a request whose successful body is ignored.
    async fn request_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<(), ApiError> {
        self.execute(method, url, body, token).await?;
        Ok(())
    }

    async fn request_required<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        self.request(method, url, body, token)
            .await?
            .ok_or(ApiError::EmptyBody)
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.url("/auth/register")?;
        self.request_required(Method::POST, url, Some(payload), None)
            .await
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.url("/auth/login")?;
        self.request_required(Method::POST, url, Some(payload), None)
            .await
    }

    pub async fn verify_code(&self, payload: &VerifyRequest) -> Result<Option<Value>, ApiError> {
        let url = self.url("/auth/verify")?;
        self.request(Method::POST, url, Some(payload), None).await
    }

    pub async fn resend_code(
        &self,
        payload: &ResendCodeRequest,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.url("/auth/resendCode")?;
        self.request(Method::PUT, url, Some(payload), None).await
    }

    pub async fn me(&self, token: &str) -> Result<User, ApiError> {
        let url = self.url("/auth/me")?;
        self.request_required(Method::GET, url, None::<&()>, Some(token))
            .await
    }

    pub async fn update_user(
        &self,
        token: &str,
        payload: &UpdateUserRequest,
    ) -> Result<User, ApiError> {
        let url = self.url("/auth/me/update")?;
        self.request_required(Method::PUT, url, Some(payload), Some(token))
            .await
    }

    pub async fn change_password(
        &self,
        email: &str,
        payload: &ChangePasswordRequest,
    ) -> Result<Option<Value>, ApiError> {
        let mut url = self.url("/auth/changepass")?;
        url.query_pairs_mut().append_pair("email", email);
        self.request(Method::PUT, url, Some(payload), None).await
    }

    pub async fn logout(&self, token: Option<&str>) -> Result<(), ApiError> {
        let url = self.url("/auth/logout")?;
        self.request_unit(Method::POST, url, None::<&()>, token)
            .await
    }

    pub async fn currencies(&self) -> Result<Vec<Currency>, ApiError> {
        let url = self.url("/api/currency")?;
        Ok(self
            .request(Method::GET, url, None::<&()>, None)
            .await?
            .unwrap_or_default())
    }

    pub async fn amount_summary(&self, token: &str) -> Result<AmountSummary, ApiError> {
        let url = self.url("/api/reports/amounts")?;
        self.request_required(Method::GET, url, None::<&()>, Some(token))
            .await
    }

    /// `GET <path>` for a resource collection.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(path)?;
        Ok(self
            .request(Method::GET, url, None::<&()>, Some(token))
            .await?
            .unwrap_or_default())
    }

    /// `POST <path>`; the server answers with the created entity.
    pub async fn create<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: &str,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        self.request_required(Method::POST, url, Some(body), Some(token))
            .await
    }

    /// `PUT <path>/<id>`; the raw JSON answer is merged by the caller.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        path: &str,
        id: &str,
        body: &B,
        token: &str,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.item_url(path, id)?;
        self.request(Method::PUT, url, Some(body), Some(token))
            .await
    }

    /// `DELETE <path>/<id>`.
    pub async fn delete(&self, path: &str, id: &str, token: &str) -> Result<(), ApiError> {
        let url = self.item_url(path, id)?;
        self.request_unit(Method::DELETE, url, None::<&()>, Some(token))
            .await
    }
}
