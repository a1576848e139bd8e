//! Session manager: owns the signed-in user and token pair, mirrors them to
//! the secure store, exposes a reactive auth state, and guarantees that at
//! most one token refresh is in flight at any time.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{ApiClient, TokenPair, UserProfile};
use crate::error::ClientError;
use crate::jwt;
use crate::storage::{keys, SessionStore};

/// A token this close to expiry is refreshed before being attached.
const REFRESH_LEEWAY_SECS: i64 = 30;
/// Wider window used by periodic background checks.
const BACKGROUND_REFRESH_LEEWAY_SECS: i64 = 300;

/// Snapshot of the authentication state, published through a watch channel
/// so the UI can react to logins, logouts, and forced expiries.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

#[derive(Debug, Clone)]
struct Session {
    user: UserProfile,
    access_token: String,
    refresh_token: String,
}

struct Inner {
    api: ApiClient,
    store: Box<dyn SessionStore>,
    session: std::sync::Mutex<Option<Session>>,
    // Serializes refreshes. Tasks that lose the race re-check the current
    // token after acquiring and skip the network call.
    refresh_gate: tokio::sync::Mutex<()>,
    state_tx: watch::Sender<AuthState>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: Box<dyn SessionStore>) -> Self {
        let (state_tx, _) = watch::channel(AuthState::default());
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                session: std::sync::Mutex::new(None),
                refresh_gate: tokio::sync::Mutex::new(()),
                state_tx,
            }),
        }
    }

    /// Subscribe to auth state changes.
    pub fn state(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.lock_session().as_ref().map(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_session().is_some()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        // A poisoned lock means a panic mid-update; propagating the panic
        // is the only sound option.
        self.inner.session.lock().expect("session lock poisoned")
    }

    fn access_token_snapshot(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.access_token.clone())
    }

    fn refresh_token_snapshot(&self) -> Option<String> {
        self.lock_session()
            .as_ref()
            .map(|s| s.refresh_token.clone())
    }

    fn publish_state(&self, is_loading: bool) {
        let user = self.current_user();
        let _ = self.inner.state_tx.send(AuthState {
            is_authenticated: user.is_some(),
            user,
            is_loading,
        });
    }

    fn install_session(&self, session: Session) -> Result<(), ClientError> {
        self.inner
            .store
            .set(keys::ACCESS_TOKEN, &session.access_token)?;
        self.inner
            .store
            .set(keys::REFRESH_TOKEN, &session.refresh_token)?;
        let user_json = serde_json::to_string(&serde_json::json!({
            "id": session.user.id,
            "email": session.user.email,
            "fullName": session.user.full_name,
        }))
        .map_err(|err| ClientError::Storage(err.to_string()))?;
        self.inner.store.set(keys::CURRENT_USER, &user_json)?;
        *self.lock_session() = Some(session);
        self.publish_state(false);
        Ok(())
    }

    fn install_tokens(&self, pair: TokenPair) -> Result<(), ClientError> {
        self.inner.store.set(keys::ACCESS_TOKEN, &pair.access_token)?;
        self.inner
            .store
            .set(keys::REFRESH_TOKEN, &pair.refresh_token)?;
        if let Some(session) = self.lock_session().as_mut() {
            session.access_token = pair.access_token;
            session.refresh_token = pair.refresh_token;
        }
        Ok(())
    }

    fn clear_session(&self) {
        let _ = self.inner.store.delete(keys::ACCESS_TOKEN);
        let _ = self.inner.store.delete(keys::REFRESH_TOKEN);
        let _ = self.inner.store.delete(keys::CURRENT_USER);
        *self.lock_session() = None;
        self.publish_state(false);
    }

    /// Rehydrate the session from the secure store on app start. Returns
    /// whether a usable session was restored. A stored access token about
    /// to expire is refreshed eagerly; a rejected refresh wipes the stale
    /// session so the app starts signed out.
    pub async fn restore_session(&self) -> Result<bool, ClientError> {
        let access = self.inner.store.get(keys::ACCESS_TOKEN)?;
        let refresh = self.inner.store.get(keys::REFRESH_TOKEN)?;
        let user_json = self.inner.store.get(keys::CURRENT_USER)?;

        let (Some(access), Some(refresh), Some(user_json)) = (access, refresh, user_json) else {
            return Ok(false);
        };
        let stored: serde_json::Value = serde_json::from_str(&user_json)
            .map_err(|err| ClientError::Storage(err.to_string()))?;
        let user = UserProfile {
            id: stored["id"].as_str().unwrap_or_default().to_string(),
            email: stored["email"].as_str().unwrap_or_default().to_string(),
            full_name: stored["fullName"].as_str().unwrap_or_default().to_string(),
        };

        *self.lock_session() = Some(Session {
            user,
            access_token: access.clone(),
            refresh_token: refresh,
        });
        self.publish_state(false);

        if jwt::expires_within(&access, REFRESH_LEEWAY_SECS) {
            match self.refresh_with_gate(Some(&access)).await {
                Ok(()) => {}
                Err(ClientError::SessionExpired) => return Ok(false),
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }

    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserProfile, ClientError> {
        self.publish_state(true);
        let result = self.inner.api.signup(email, password, full_name).await;
        match result {
            Ok(payload) => {
                let user = payload.user.clone();
                self.install_session(Session {
                    user: payload.user,
                    access_token: payload.access_token,
                    refresh_token: payload.refresh_token,
                })?;
                Ok(user)
            }
            Err(err) => {
                self.publish_state(false);
                Err(err)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        self.publish_state(true);
        let result = self.inner.api.login(email, password).await;
        match result {
            Ok(payload) => {
                let user = payload.user.clone();
                self.install_session(Session {
                    user: payload.user,
                    access_token: payload.access_token,
                    refresh_token: payload.refresh_token,
                })?;
                Ok(user)
            }
            Err(err) => {
                self.publish_state(false);
                Err(err)
            }
        }
    }

    /// Ends the local session regardless of whether the server call lands;
    /// a device that cannot reach the server must still be able to sign out.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let refresh = self.refresh_token_snapshot();
        let result = self.inner.api.logout(refresh.as_deref()).await;
        self.clear_session();
        if let Err(err) = result {
            log::warn!("server-side logout failed, local session cleared: {err}");
        }
        Ok(())
    }

    pub async fn logout_all_devices(&self) -> Result<(), ClientError> {
        let api = self.inner.api.clone();
        let result = self
            .authorized(move |token| {
                let api = api.clone();
                async move { api.logout_all(&token).await }
            })
            .await;
        self.clear_session();
        result.map(|_| ())
    }

    pub async fn reset_password(&self, email: &str) -> Result<String, ClientError> {
        let message = self.inner.api.reset_password(email).await?;
        Ok(message.message)
    }

    pub async fn update_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<String, ClientError> {
        let api = self.inner.api.clone();
        let current = current_password.to_string();
        let new = new_password.to_string();
        let message = self
            .authorized(move |token| {
                let api = api.clone();
                let current = current.clone();
                let new = new.clone();
                async move { api.update_password(&token, &current, &new).await }
            })
            .await?;
        Ok(message.message)
    }

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        let api = self.inner.api.clone();
        let user = self
            .authorized(move |token| {
                let api = api.clone();
                async move { api.profile(&token).await }
            })
            .await?;
        if let Some(session) = self.lock_session().as_mut() {
            session.user = user.clone();
        }
        self.publish_state(false);
        Ok(user)
    }

    /// Returns an access token guaranteed to be good for at least the
    /// refresh leeway, refreshing through the gate if necessary.
    pub async fn fresh_access_token(&self) -> Result<String, ClientError> {
        let observed = self
            .access_token_snapshot()
            .ok_or(ClientError::SessionExpired)?;
        if jwt::expires_within(&observed, REFRESH_LEEWAY_SECS) {
            self.refresh_with_gate(Some(&observed)).await?;
        }
        self.access_token_snapshot()
            .ok_or(ClientError::SessionExpired)
    }

    /// Unconditionally rotate the token pair.
    pub async fn refresh_tokens(&self) -> Result<(), ClientError> {
        self.refresh_with_gate(None).await
    }

    /// Background check: refresh only when the access token is inside the
    /// wide expiry window. Safe to call on a timer.
    pub async fn refresh_if_expiring(&self) -> Result<(), ClientError> {
        let Some(observed) = self.access_token_snapshot() else {
            return Ok(());
        };
        if jwt::expires_within(&observed, BACKGROUND_REFRESH_LEEWAY_SECS) {
            self.refresh_with_gate(Some(&observed)).await?;
        }
        Ok(())
    }

    /// Perform a refresh while holding the gate. `observed` is the access
    /// token the caller saw before queueing; if the token changed while
    /// waiting for the gate and the new one is not about to expire, another
    /// task already refreshed and this call is a no-op.
    async fn refresh_with_gate(&self, observed: Option<&str>) -> Result<(), ClientError> {
        let _gate = self.inner.refresh_gate.lock().await;

        if let Some(observed) = observed {
            if let Some(current) = self.access_token_snapshot() {
                if current != observed && !jwt::expires_within(&current, REFRESH_LEEWAY_SECS) {
                    return Ok(());
                }
            }
        }

        let refresh = match self.refresh_token_snapshot() {
            Some(token) => token,
            None => {
                self.clear_session();
                return Err(ClientError::SessionExpired);
            }
        };

        match self.inner.api.refresh(&refresh).await {
            Ok(pair) => {
                self.install_tokens(pair)?;
                log::debug!("access token refreshed");
                Ok(())
            }
            Err(err) if err.is_auth_rejection() => {
                // The refresh token itself was rejected. The session is
                // unrecoverable without a new login.
                log::warn!("refresh token rejected, ending session");
                self.clear_session();
                Err(ClientError::SessionExpired)
            }
            // Transient failures keep the session; the next attempt may
            // succeed once the network is back.
            Err(err) => Err(err),
        }
    }

    /// Run an authenticated call with a fresh token, refreshing and retrying
    /// exactly once if the server rejects the credential mid-flight.
    async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, ClientError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let token = self.fresh_access_token().await?;
        match call(token.clone()).await {
            Err(err) if err.is_auth_rejection() => {
                self.refresh_with_gate(Some(&token)).await?;
                let retry_token = self
                    .access_token_snapshot()
                    .ok_or(ClientError::SessionExpired)?;
                match call(retry_token).await {
                    Err(err) if err.is_auth_rejection() => {
                        self.clear_session();
                        Err(ClientError::SessionExpired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }
}
