//! Session lifecycle: the single source of truth for who is logged in.
//!
//! Constructed once at application startup and passed by reference to
//! whatever needs it; there is no ambient global state. `init` resolves
//! the stored credentials exactly once, after which only `login` and
//! `logout` move the session between authenticated and anonymous.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{LoginResponse, NewUser, RegisterResponse, User};
use crate::token::TokenPair;

/// Observable session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial resolution of stored credentials is still pending.
    Resolving,
    /// A user is logged in.
    Authenticated,
    /// No user; resolution finished or the session ended.
    Anonymous,
}

/// Outcome of a login attempt. Failures are returned, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    LoggedIn,
    Denied(String),
}

impl LoginOutcome {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, LoginOutcome::LoggedIn)
    }
}

/// The current session.
pub struct Session {
    api: Arc<ApiClient>,
    user: Option<User>,
    resolved: bool,
}

impl Session {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            user: None,
            resolved: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if !self.resolved {
            SessionState::Resolving
        } else if self.user.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Derived flag: authenticated means a user record is present.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_resolving(&self) -> bool {
        !self.resolved
    }

    /// Resolve the stored credentials into a user, once.
    ///
    /// With an access token present, asks `auth/me/` who we are (through
    /// the pipeline, so an expired access token gets its one silent
    /// refresh). Any failure clears both tokens: a session we cannot
    /// resolve is treated as invalid. Subsequent calls are no-ops.
    pub async fn init(&mut self) {
        if self.resolved {
            tracing::debug!("session already resolved");
            return;
        }

        if self.api.tokens().get().access.is_some() {
            match self.api.get::<User>("auth/me/", &[]).await {
                Ok(user) => {
                    tracing::debug!(username = %user.username, "session restored");
                    self.user = Some(user);
                }
                Err(err) => {
                    tracing::debug!(error = %err, "stored session invalid, clearing tokens");
                    if let Err(err) = self.api.tokens().clear() {
                        tracing::warn!(error = %err, "failed to clear stored tokens");
                    }
                }
            }
        }
        self.resolved = true;
    }

    /// Authenticate against `auth/login/` and persist the token pair.
    pub async fn login(&mut self, username: &str, password: &str) -> LoginOutcome {
        let body = serde_json::json!({ "username": username, "password": password });
        match self.api.post::<LoginResponse, _>("auth/login/", &body).await {
            Ok(response) => {
                let pair = TokenPair {
                    access: response.access,
                    refresh: response.refresh,
                };
                if let Err(err) = self.api.tokens().set(&pair) {
                    tracing::error!(error = %err, "failed to store credentials");
                    self.resolved = true;
                    return LoginOutcome::Denied(format!("Failed to store credentials: {err}"));
                }
                tracing::info!(username = %response.user.username, "logged in");
                self.user = Some(response.user);
                self.resolved = true;
                LoginOutcome::LoggedIn
            }
            Err(ApiError::Unauthorized) => {
                // A settled login attempt resolves the session either way.
                self.resolved = true;
                LoginOutcome::Denied("Invalid username or password".to_string())
            }
            Err(err) => {
                tracing::error!(error = %err, "login failed");
                self.resolved = true;
                let message = err
                    .detail()
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "Login failed".to_string());
                LoginOutcome::Denied(message)
            }
        }
    }

    /// End the session. The remote call is best-effort; local state is
    /// cleared regardless of its outcome.
    pub async fn logout(&mut self) {
        let request = crate::client::ApiRequest::post("auth/logout/")
            .json_value(serde_json::json!({}));
        if let Err(err) = self.api.send_ok(request).await {
            tracing::warn!(error = %err, "logout request failed, clearing local session anyway");
        }
        if let Err(err) = self.api.tokens().clear() {
            tracing::warn!(error = %err, "failed to clear stored tokens");
        }
        self.user = None;
    }

    /// Create an account. Validation failures propagate field-keyed so the
    /// caller can render them inline.
    pub async fn register(&self, new_user: &NewUser) -> Result<RegisterResponse, ApiError> {
        self.api.post("auth/register/", new_user).await
    }

    /// Drop the in-memory session without touching stored tokens. The
    /// counterpart of construction; `logout` is the operation that revokes
    /// credentials.
    pub fn teardown(&mut self) {
        self.user = None;
    }
}
