//! Supabase Auth Client
//!
//! Talks to the GoTrue endpoints under `/auth/v1`, keeps the current
//! session in memory and in a [`SessionStore`], and notifies listeners of
//! every auth state change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::lock::Mutex as AsyncMutex;
use serde_json::{json, Value};
use url::Url;

use super::response::ensure_success;
use crate::config::SupabaseConfig;
use crate::domain::{AuthEvent, DomainError, DomainResult, Session, User};
use crate::repository::{
    lock, AuthCallback, AuthListeners, IdentityService, SessionStore, Subscription,
};

/// Sessions expiring within this window are refreshed by the auto-refresh tick
pub const AUTO_REFRESH_WINDOW_SECS: i64 = 90;

/// Third-party sign-in providers offered by the auth panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Github,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Github => "github",
        }
    }
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Auto-confirmed project: the user is signed in
    SignedIn(Session),
    /// A confirmation email was sent to the user
    ConfirmationSent(User),
}

pub struct SupabaseAuth {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
    store: Arc<dyn SessionStore>,
    session: Mutex<Option<Session>>,
    /// Held across a refresh so concurrent callers share its result
    refresh_gate: AsyncMutex<()>,
    listeners: AuthListeners,
}

impl SupabaseAuth {
    pub(crate) fn new(
        http: reqwest::Client,
        config: Arc<SupabaseConfig>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http,
            config,
            store,
            session: Mutex::new(None),
            refresh_gate: AsyncMutex::new(()),
            listeners: AuthListeners::new(),
        }
    }

    /// `POST /auth/v1/token?grant_type=password`
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> DomainResult<Session> {
        let session = self
            .token_request("password", json!({ "email": email, "password": password }))
            .await?;
        self.set_session(session.clone(), AuthEvent::SignedIn);
        Ok(session)
    }

    /// `POST /auth/v1/signup`
    pub async fn sign_up(&self, email: &str, password: &str) -> DomainResult<SignUpOutcome> {
        let url = self.config.endpoint("auth/v1/signup")?;
        let response = self
            .anon_request(reqwest::Method::POST, url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;

        if body.get("access_token").is_some() {
            let session = serde_json::from_value::<Session>(body)?.with_expiry_from(now());
            self.set_session(session.clone(), AuthEvent::SignedIn);
            return Ok(SignUpOutcome::SignedIn(session));
        }
        // Confirmation required: the body is the user itself (older servers nest it)
        let user_value = body.get("user").cloned().unwrap_or(body);
        let user: User = serde_json::from_value(user_value)?;
        tracing::info!(user_id = %user.id, "sign-up pending email confirmation");
        Ok(SignUpOutcome::ConfirmationSent(user))
    }

    /// URL to send the browser to for a third-party sign-in
    pub fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: Option<&str>,
    ) -> DomainResult<Url> {
        let mut url = self.config.endpoint("auth/v1/authorize")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("provider", provider.as_str());
            if let Some(redirect_to) = redirect_to {
                pairs.append_pair("redirect_to", redirect_to);
            }
        }
        Ok(url)
    }

    /// Complete an OAuth redirect from the tokens in the URL fragment.
    ///
    /// Returns `Ok(None)` when the fragment carries no tokens.
    pub async fn session_from_url_fragment(&self, fragment: &str) -> DomainResult<Option<Session>> {
        let mut params: HashMap<String, String> =
            url::form_urlencoded::parse(fragment.trim_start_matches('#').as_bytes())
                .into_owned()
                .collect();

        if let Some(description) = params.remove("error_description") {
            return Err(DomainError::service(400, description));
        }
        let Some(access_token) = params.remove("access_token") else {
            return Ok(None);
        };
        let number = |key: &str| params.get(key).and_then(|v| v.parse::<i64>().ok());
        let expires_in = number("expires_in").unwrap_or_default();
        let expires_at = number("expires_at");

        let user = self.fetch_user(&access_token).await?;
        let session = Session {
            access_token,
            refresh_token: params.remove("refresh_token").unwrap_or_default(),
            token_type: params
                .remove("token_type")
                .unwrap_or_else(|| "bearer".to_string()),
            expires_in,
            expires_at,
            user,
        }
        .with_expiry_from(now());
        self.set_session(session.clone(), AuthEvent::SignedIn);
        Ok(Some(session))
    }

    /// Refresh when the session expires within [`AUTO_REFRESH_WINDOW_SECS`]
    pub async fn refresh_if_expiring(&self) -> DomainResult<()> {
        match self.current() {
            Some(session) if session.expires_within(now(), AUTO_REFRESH_WINDOW_SECS) => {
                self.refresh_from(&session).await.map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Bearer token for row-store requests: the user's, else the anon key.
    ///
    /// A session that cannot be refreshed is an error, not an anonymous request.
    pub async fn access_token(&self) -> DomainResult<String> {
        Ok(match self.get_session().await? {
            Some(session) => session.access_token,
            None => self.config.anon_key().to_string(),
        })
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================
    // Internals
    // ========================

    fn anon_request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.config.anon_key())
            .bearer_auth(self.config.anon_key())
    }

    async fn token_request(&self, grant_type: &str, body: Value) -> DomainResult<Session> {
        let mut url = self.config.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let response = self
            .anon_request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        let session: Session = ensure_success(response).await?.json().await?;
        Ok(session.with_expiry_from(now()))
    }

    /// Exchange `stale`'s refresh token for a new session.
    ///
    /// Only a rejected refresh token (4xx) ends the session; transport and
    /// server failures keep it for the next attempt.
    async fn refresh_from(&self, stale: &Session) -> DomainResult<Session> {
        let _gate = self.refresh_gate.lock().await;
        // Someone else refreshed or signed out while this caller waited
        match self.current() {
            None => return Err(DomainError::NotAuthenticated),
            Some(current) if current.refresh_token != stale.refresh_token => return Ok(current),
            Some(_) => {}
        }

        if stale.refresh_token.is_empty() {
            self.clear_session();
            return Err(DomainError::NotAuthenticated);
        }
        match self
            .token_request("refresh_token", json!({ "refresh_token": stale.refresh_token }))
            .await
        {
            Ok(session) => {
                self.set_session(session.clone(), AuthEvent::TokenRefreshed);
                Ok(session)
            }
            Err(err) if is_rejection(&err) => {
                tracing::warn!(error = %err, "refresh token rejected, signing out");
                self.clear_session();
                Err(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, "session refresh failed, keeping session");
                Err(err)
            }
        }
    }

    async fn fetch_user(&self, access_token: &str) -> DomainResult<User> {
        let url = self.config.endpoint("auth/v1/user")?;
        let response = self
            .http
            .get(url)
            .header("apikey", self.config.anon_key())
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// In-memory session, else the persisted one
    fn current(&self) -> Option<Session> {
        let mut guard = lock(&self.session);
        if guard.is_none() {
            *guard = self
                .store
                .load()
                .and_then(|raw| match serde_json::from_str::<Session>(&raw) {
                    Ok(session) => Some(session),
                    Err(err) => {
                        tracing::warn!(error = %err, "discarding unreadable stored session");
                        None
                    }
                });
        }
        guard.clone()
    }

    fn set_session(&self, session: Session, event: AuthEvent) {
        match serde_json::to_string(&session) {
            Ok(raw) => {
                if let Err(err) = self.store.save(&raw) {
                    tracing::warn!(error = %err, "failed to persist session");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to serialize session"),
        }
        *lock(&self.session) = Some(session.clone());
        self.listeners.emit(event, Some(&session));
    }

    fn clear_session(&self) {
        lock(&self.session).take();
        self.store.remove();
        self.listeners.emit(AuthEvent::SignedOut, None);
    }
}

#[async_trait(?Send)]
impl IdentityService for SupabaseAuth {
    async fn get_session(&self) -> DomainResult<Option<Session>> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        if !session.is_expired_at(now()) {
            return Ok(Some(session));
        }
        self.refresh_from(&session).await.map(Some)
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.subscribe(callback)
    }

    /// `POST /auth/v1/logout`; a session the server no longer knows is
    /// treated as already signed out
    async fn sign_out(&self) -> DomainResult<()> {
        if let Some(session) = self.current() {
            let url = self.config.endpoint("auth/v1/logout")?;
            let response = self
                .http
                .post(url)
                .header("apikey", self.config.anon_key())
                .bearer_auth(&session.access_token)
                .send()
                .await?;
            match ensure_success(response).await {
                Ok(_) => {}
                Err(err) if matches!(err.status(), Some(401) | Some(404)) => {
                    tracing::debug!(error = %err, "session already gone on server");
                }
                Err(err) => return Err(err),
            }
        }
        self.clear_session();
        Ok(())
    }
}

fn is_rejection(err: &DomainError) -> bool {
    matches!(err.status(), Some(400..=499))
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
