//! Session state: token, profile, and the background profile refresh.
//!
//! [`SessionStore`] is the only writer of the [`Session`]; everyone else
//! reads snapshots or subscribes to the watch channel. The session is cleared
//! on logout and on a 401/403 from an authenticated call, and never on
//! network errors.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{LuxError, Result};
use crate::rest::LuxHttpClient;
use crate::storage::{TokenStore, ADMIN_TOKEN_KEY, USER_TOKEN_KEY};
use crate::types::{RegisterData, UserProfile};

/// Token and last fetched profile. Anonymous when `token` is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Profile balance, if a profile has been fetched.
    pub fn balance(&self) -> Option<f64> {
        self.user.as_ref().map(|u| u.balance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    pub is_admin: bool,
}

struct Inner {
    http: LuxHttpClient,
    tokens: Arc<dyn TokenStore>,
    tx: watch::Sender<Session>,
    visible: Notify,
    refresh_interval: Duration,
}

/// Shared handle to the process-wide session. Cheap to clone.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.inner.tx.borrow())
            .finish()
    }
}

impl SessionStore {
    /// Create the store, picking up any token persisted by a previous run.
    ///
    /// The profile is not fetched; call [`SessionStore::restore`] for that.
    pub fn new(
        http: LuxHttpClient,
        tokens: Arc<dyn TokenStore>,
        refresh_interval: Duration,
    ) -> Self {
        let token = tokens.get(USER_TOKEN_KEY);
        let (tx, _) = watch::channel(Session { token, user: None });
        Self {
            inner: Arc::new(Inner {
                http,
                tokens,
                tx,
                visible: Notify::new(),
                refresh_interval,
            }),
        }
    }

    pub fn http(&self) -> &LuxHttpClient {
        &self.inner.http
    }

    pub fn snapshot(&self) -> Session {
        self.inner.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.tx.borrow().token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.inner.tx.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.tx.borrow().is_authenticated()
    }

    /// Receive every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.tx.subscribe()
    }

    /// Fetch the profile for a token loaded at startup.
    ///
    /// Anonymous sessions return `Ok(None)` without touching the network.
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        if !self.is_authenticated() {
            debug!("no persisted session");
            return Ok(None);
        }
        self.refresh_user().await
    }

    /// Exchange credentials for a token and load the profile.
    ///
    /// Admins additionally get the token persisted under the admin key. A
    /// transient failure fetching the profile keeps the new session and
    /// reports `is_admin: false`.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let token = self.inner.http.login(username, password).await?.access_token;

        self.inner.tokens.set(USER_TOKEN_KEY, &token)?;
        self.inner.tx.send_replace(Session {
            token: Some(token.clone()),
            user: None,
        });

        let is_admin = match self.inner.http.get_me(&token).await {
            Ok(profile) => {
                let is_admin = profile.is_admin();
                if is_admin {
                    self.inner.tokens.set(ADMIN_TOKEN_KEY, &token)?;
                } else {
                    self.inner.tokens.remove(ADMIN_TOKEN_KEY)?;
                }
                self.publish_user(&token, profile);
                is_admin
            }
            Err(e) if e.is_unauthorized() => {
                self.expire(&token);
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "logged in but profile fetch failed");
                false
            }
        };

        info!(username, is_admin, "logged in");
        Ok(LoginOutcome { is_admin })
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// A rejected registration returns the backend's message and never
    /// attempts the login.
    pub async fn register(&self, data: &RegisterData) -> Result<LoginOutcome> {
        self.inner.http.register(data).await?;
        info!(username = %data.username, "account created");
        self.login(&data.username, &data.password).await
    }

    /// Forget the session locally. No network request is made.
    pub fn logout(&self) -> Result<()> {
        self.inner.tx.send_replace(Session::default());
        self.inner.tokens.remove(USER_TOKEN_KEY)?;
        self.inner.tokens.remove(ADMIN_TOKEN_KEY)?;
        info!("logged out");
        Ok(())
    }

    /// Re-fetch the profile and replace the cached one wholesale.
    ///
    /// 401/403 clears the session; any other failure leaves it untouched.
    pub async fn refresh_user(&self) -> Result<Option<UserProfile>> {
        let Some(token) = self.token() else {
            return Ok(None);
        };
        match self.inner.http.get_me(&token).await {
            Ok(profile) => {
                self.publish_user(&token, profile.clone());
                Ok(Some(profile))
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.expire(&token);
                }
                Err(e)
            }
        }
    }

    /// Run an authenticated call with the current token.
    ///
    /// Fails with [`LuxError::NotAuthenticated`] before any I/O when there is
    /// no session. A 401/403 from the call clears the session.
    pub async fn authorized<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let token = self.token().ok_or(LuxError::NotAuthenticated)?;
        let result = f(token.clone()).await;
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.expire(&token);
            }
        }
        result
    }

    /// Ask the background refresh to run now (focus/visibility analogue).
    pub fn notify_visible(&self) {
        self.inner.visible.notify_one();
    }

    /// Spawn the periodic profile refresh.
    ///
    /// Runs once right away, then on every interval tick and every
    /// [`SessionStore::notify_visible`]. Idles while anonymous. Errors are
    /// logged and swallowed.
    pub fn start_background_refresh(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let store = self.clone();
        let period = self.inner.refresh_interval;

        tokio::spawn(async move {
            let mut rx = store.subscribe();
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if !rx.borrow_and_update().is_authenticated() {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            interval.reset_immediately();
                            continue;
                        }
                    }
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                    _ = store.inner.visible.notified() => {}
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }

                match store.refresh_user().await {
                    Ok(_) => debug!("profile refreshed"),
                    Err(e) if e.is_unauthorized() => warn!("session rejected, logged out"),
                    Err(e) => debug!(error = %e, "profile refresh failed"),
                }
            }
            debug!("profile refresh stopped");
        })
    }

    /// Replace the profile unless the session moved on while it was in flight.
    fn publish_user(&self, token: &str, profile: UserProfile) {
        self.inner.tx.send_if_modified(|session| {
            if session.token.as_deref() != Some(token) {
                return false;
            }
            let changed = session.user.as_ref() != Some(&profile);
            session.user = Some(profile);
            changed
        });
    }

    /// Clear the session after the backend rejected `token`.
    fn expire(&self, token: &str) {
        let cleared = self.inner.tx.send_if_modified(|session| {
            if session.token.as_deref() != Some(token) {
                return false;
            }
            *session = Session::default();
            true
        });
        if !cleared {
            return;
        }
        for key in [USER_TOKEN_KEY, ADMIN_TOKEN_KEY] {
            if let Err(e) = self.inner.tokens.remove(key) {
                warn!(key, error = %e, "failed to remove stored token");
            }
        }
        warn!("session token rejected by the backend, cleared");
    }
}
