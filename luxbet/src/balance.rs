//! Balance reconciliation with the game provider.
//!
//! In transfer mode part of the player's money sits with the provider while a
//! game is open. `available-balance` reports that with `needs_sync`, and
//! `sync-balance` pulls it back. Balances are only ever read from the backend.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{LuxError, Result};
use crate::session::SessionStore;
use crate::types::AvailableBalance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// Figures came from `/api/auth/available-balance`.
    Backend,
    /// The balance endpoint failed; only the cached profile balance is known.
    LastKnown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSnapshot {
    pub available_balance: Option<f64>,
    pub total_balance: Option<f64>,
    pub our_balance: Option<f64>,
    /// Still true after a sync attempt if the provider has not released funds yet.
    pub needs_sync: bool,
    /// Whether `sync-balance` was called while taking this snapshot.
    pub synced: bool,
    pub profile_balance: Option<f64>,
    pub source: BalanceSource,
}

impl BalanceSnapshot {
    fn from_backend(b: AvailableBalance, synced: bool, profile_balance: Option<f64>) -> Self {
        Self {
            available_balance: b.available_balance,
            total_balance: b.total_balance,
            our_balance: b.our_balance,
            needs_sync: b.needs_sync,
            synced,
            profile_balance,
            source: BalanceSource::Backend,
        }
    }

    fn last_known(profile_balance: Option<f64>) -> Self {
        Self {
            available_balance: None,
            total_balance: None,
            our_balance: None,
            needs_sync: false,
            synced: false,
            profile_balance,
            source: BalanceSource::LastKnown,
        }
    }

    /// Withdrawable now.
    pub fn available(&self) -> f64 {
        self.available_balance
            .or(self.profile_balance)
            .unwrap_or(0.0)
    }

    /// Including funds still held by the provider.
    pub fn total(&self) -> f64 {
        self.total_balance.or(self.profile_balance).unwrap_or(0.0)
    }

    /// Balance shown to the player.
    pub fn display(&self) -> f64 {
        self.our_balance
            .or(self.total_balance)
            .or(self.profile_balance)
            .unwrap_or(0.0)
    }

    /// Check that `amount` can be withdrawn right now.
    ///
    /// When the total would cover it but a sync is still pending the caller
    /// gets [`LuxError::SyncPending`] so the player knows to retry shortly.
    pub fn check_withdrawable(&self, amount: f64) -> Result<()> {
        let available = self.available();
        if available >= amount {
            return Ok(());
        }
        let total = self.total();
        if self.needs_sync && total >= amount {
            return Err(LuxError::SyncPending { total });
        }
        Err(LuxError::InsufficientBalance { available })
    }
}

/// Runs the available-balance / sync-balance dance for the current session.
#[derive(Debug, Clone)]
pub struct BalanceSynchronizer {
    session: SessionStore,
}

impl BalanceSynchronizer {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Make sure provider-held funds are back before the balance is used.
    ///
    /// When the backend says a sync is needed, `sync-balance` is called (its
    /// failure is logged, not returned), the balance is queried again and the
    /// profile refreshed. A non-auth failure of the first query falls back to
    /// the cached profile balance. 401/403 is returned and clears the session.
    pub async fn ensure_synced(&self) -> Result<BalanceSnapshot> {
        let http = self.session.http();
        let profile_balance = self.session.snapshot().balance();

        let first = match self
            .session
            .authorized(|t| async move { http.get_available_balance(&t).await })
            .await
        {
            Ok(b) => b,
            Err(e) if is_session_error(&e) => return Err(e),
            Err(e) => {
                warn!(error = %e, "available-balance failed, using last known balance");
                return Ok(BalanceSnapshot::last_known(profile_balance));
            }
        };

        if !first.needs_sync {
            debug!(available = ?first.available_balance, "balance in sync");
            return Ok(BalanceSnapshot::from_backend(first, false, profile_balance));
        }

        info!(total = ?first.total_balance, "funds held by game provider, syncing");
        match self
            .session
            .authorized(|t| async move { http.sync_balance(&t).await })
            .await
        {
            Ok(res) => info!(message = ?res.message, "balance synced"),
            Err(e) if is_session_error(&e) => return Err(e),
            Err(e) => warn!(error = %e, "sync-balance failed"),
        }

        let second = match self
            .session
            .authorized(|t| async move { http.get_available_balance(&t).await })
            .await
        {
            Ok(b) => b,
            Err(e) if is_session_error(&e) => return Err(e),
            Err(e) => {
                warn!(error = %e, "available-balance re-query failed");
                first
            }
        };

        let profile_balance = match self.session.refresh_user().await {
            Ok(profile) => profile.map(|u| u.balance).or(profile_balance),
            Err(e) if is_session_error(&e) => return Err(e),
            Err(e) => {
                debug!(error = %e, "profile refresh after sync failed");
                profile_balance
            }
        };

        Ok(BalanceSnapshot::from_backend(second, true, profile_balance))
    }
}

fn is_session_error(e: &LuxError) -> bool {
    e.is_unauthorized() || matches!(e, LuxError::NotAuthenticated)
}
