//! Authenticated session: current user, bearer token and verification state.
//!
//! Every mutating operation raises `loading` for its duration and owns a single
//! error slot. Concurrent calls race on both: the last one to finish wins.
//!
//! Identity changes (who is logged in, with which token) are published through
//! a [`watch`] channel. Dependent stores subscribe to it instead of being
//! called from here, so the session does not know who consumes it.
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use api_types::auth::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, ResendCodeRequest,
    UpdateUserRequest, User, VerifyRequest,
};
use serde_json::Value;
use tokio::sync::watch;

use crate::{
    api::ApiClient,
    error::StoreError,
    storage::{Storage, TOKEN_KEY},
    toast::Toasts,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub token: String,
}

/// Published identity plus a generation that grows on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityState {
    pub generation: u64,
    pub identity: Option<Identity>,
}

/// Token and generation captured when a store operation starts.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub token: String,
    generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    storage: Arc<Storage>,
    toasts: Arc<Toasts>,
    state: RwLock<SessionSnapshot>,
    identity: watch::Sender<IdentityState>,
}

impl Session {
    pub fn new(api: ApiClient, storage: Arc<Storage>, toasts: Arc<Toasts>) -> Self {
        let (identity, _) = watch::channel(IdentityState::default());
        Self {
            api,
            storage,
            toasts,
            state: RwLock::new(SessionSnapshot::default()),
            identity,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    pub fn is_authenticated(&self) -> bool {
        let state = self.read();
        state.user.is_some() && state.token.is_some()
    }

    /// Logged in but the email code has not been confirmed yet.
    pub fn needs_verification(&self) -> bool {
        self.read().user.as_ref().is_some_and(|user| !user.verified)
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.identity.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.identity.borrow().generation
    }

    pub fn ticket(&self) -> Option<Ticket> {
        let token = self.token()?;
        Some(Ticket {
            token,
            generation: self.generation(),
        })
    }

    /// `false` once the identity changed (or pending work was cancelled)
    /// after `ticket` was taken.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.generation() == ticket.generation
    }

    /// Makes every in-flight store operation discard its result.
    pub fn cancel_pending(&self) {
        self.identity.send_modify(|state| state.generation += 1);
        tracing::debug!("pending store operations cancelled");
    }

    fn publish(&self, identity: Option<Identity>) {
        self.identity.send_if_modified(|current| {
            if current.identity == identity {
                return false;
            }
            current.generation += 1;
            current.identity = identity;
            true
        });
    }

    /// `(user id, token)` of the logged-in user.
    pub fn identity(&self) -> Option<Identity> {
        let state = self.read();
        match (&state.user, &state.token) {
            (Some(user), Some(token)) => Some(Identity {
                user_id: user.id.clone(),
                token: token.clone(),
            }),
            _ => None,
        }
    }

    fn begin(&self) {
        let mut state = self.write();
        state.loading = true;
        state.error = None;
    }

    fn finish<T>(&self, result: Result<T, StoreError>, fallback: &str) -> Result<T, StoreError> {
        let mut state = self.write();
        state.loading = false;
        if let Err(err) = &result {
            state.error = Some(err.user_message(fallback));
        }
        result
    }

    /// The token is persisted before the session is considered established.
    fn establish(&self, auth: AuthResponse) -> Result<User, StoreError> {
        self.storage.set(TOKEN_KEY, &auth.token)?;
        {
            let mut state = self.write();
            state.user = Some(auth.user.clone());
            state.token = Some(auth.token);
        }
        self.publish(self.identity());
        tracing::info!(user_id = %auth.user.id, verified = auth.user.verified, "session established");
        Ok(auth.user)
    }

    fn clear(&self) {
        {
            let mut state = self.write();
            state.user = None;
            state.token = None;
        }
        self.publish(None);
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        currency_id: i64,
    ) -> Result<User, StoreError> {
        self.begin();
        let payload = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            currency_id,
        };
        let result = self
            .api
            .register(&payload)
            .await
            .map_err(StoreError::from)
            .and_then(|auth| self.establish(auth));
        self.finish(result, "Registration failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, StoreError> {
        self.begin();
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self
            .api
            .login(&payload)
            .await
            .map_err(StoreError::from)
            .and_then(|auth| self.establish(auth));
        self.finish(result, "Login failed")
    }

    pub async fn logout(&self) -> Result<(), StoreError> {
        self.begin();
        let token = self.token();
        let result = match self.api.logout(token.as_deref()).await {
            Ok(()) => self.storage.remove(TOKEN_KEY).map_err(StoreError::from).map(|()| {
                self.clear();
                tracing::info!("session closed");
            }),
            Err(err) => Err(err.into()),
        };
        self.finish(result, "Logout failed")
    }

    /// On success the cached user is marked verified without a refetch.
    pub async fn verify_code(&self, email: &str, code: u32) -> Result<Option<Value>, StoreError> {
        self.begin();
        let payload = VerifyRequest {
            email: email.to_string(),
            code,
        };
        let result = self.api.verify_code(&payload).await.map_err(StoreError::from);
        if result.is_ok() {
            if let Some(user) = self.write().user.as_mut() {
                user.verified = true;
            }
            tracing::info!("email verified");
        }
        self.finish(result, "Verification failed")
    }

    pub async fn resend_code(&self, email: &str) -> Result<Option<Value>, StoreError> {
        self.begin();
        let payload = ResendCodeRequest {
            email: email.to_string(),
        };
        let result = self.api.resend_code(&payload).await.map_err(StoreError::from);
        self.finish(result, "Failed to resend code")
    }

    /// Restores the session from the persisted token.
    ///
    /// Failure is never surfaced: a missing or rejected token leaves the
    /// client logged out, and a rejected token is removed from storage.
    pub async fn check_auth(&self) -> bool {
        let Some(stored) = self.storage.get(TOKEN_KEY) else {
            self.clear();
            return false;
        };

        self.write().loading = true;
        let authenticated = match self.api.me(&stored).await {
            Ok(user) => {
                {
                    let mut state = self.write();
                    state.user = Some(user);
                    state.token = Some(stored);
                }
                self.publish(self.identity());
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored token rejected, clearing session");
                if let Err(err) = self.storage.remove(TOKEN_KEY) {
                    tracing::warn!(error = %err, "failed to remove stored token");
                }
                self.clear();
                false
            }
        };
        self.write().loading = false;
        authenticated
    }

    pub async fn update_user(&self, currency_id: i64) -> Result<User, StoreError> {
        self.begin();
        let result = match self.token() {
            Some(token) => self
                .api
                .update_user(&token, &UpdateUserRequest { currency_id })
                .await
                .map_err(StoreError::from),
            None => Err(StoreError::NoSession),
        };

        match &result {
            Ok(user) => {
                self.write().user = Some(user.clone());
                self.publish(self.identity());
                self.toasts.success("User updated");
            }
            Err(err) => {
                self.toasts.error(err.user_message("Failed to update user"));
            }
        }
        self.finish(result, "Failed to update user")
    }

    pub async fn change_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<Option<Value>, StoreError> {
        self.begin();
        let payload = ChangePasswordRequest {
            new_password: new_password.to_string(),
        };
        let result = self
            .api
            .change_password(email, &payload)
            .await
            .map_err(StoreError::from);
        self.finish(result, "Failed to change password")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        Session::new(api, Arc::new(Storage::memory()), Arc::new(Toasts::default()))
    }

    fn auth(id: &str, token: &str) -> AuthResponse {
        AuthResponse {
            user: User {
                id: id.to_string(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                verified: false,
                currency_id: 1,
                currency: None,
            },
            token: token.to_string(),
        }
    }

    #[test]
    fn establish_persists_token_and_bumps_generation() {
        let session = session();
        let rx = session.subscribe();
        session.establish(auth("u1", "t1")).unwrap();

        assert_eq!(session.storage.get(TOKEN_KEY).as_deref(), Some("t1"));
        assert!(session.is_authenticated());
        assert!(session.needs_verification());
        let state = rx.borrow().clone();
        assert_eq!(state.generation, 1);
        assert_eq!(state.identity.unwrap().user_id, "u1");
    }

    #[test]
    fn same_identity_is_not_republished() {
        let session = session();
        session.establish(auth("u1", "t1")).unwrap();
        session.establish(auth("u1", "t1")).unwrap();
        assert_eq!(session.generation(), 1);

        session.establish(auth("u1", "t2")).unwrap();
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn ticket_goes_stale_after_cancel_or_logout() {
        let session = session();
        assert!(session.ticket().is_none());

        session.establish(auth("u1", "t1")).unwrap();
        let ticket = session.ticket().unwrap();
        assert!(session.is_current(&ticket));

        session.cancel_pending();
        assert!(!session.is_current(&ticket));

        let ticket = session.ticket().unwrap();
        session.clear();
        assert!(!session.is_current(&ticket));
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn check_auth_without_token_stays_logged_out() {
        let session = session();
        assert!(!session.check_auth().await);
        assert!(session.error().is_none());
        assert!(!session.is_loading());
    }
}
