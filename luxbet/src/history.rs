//! Transaction and bet history.

use crate::error::Result;
use crate::session::SessionStore;
use crate::types::{Bet, Transaction};

#[derive(Debug, Clone)]
pub struct History {
    session: SessionStore,
}

impl History {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.get_transactions(&t).await })
            .await
    }

    /// Bets, optionally filtered by status (`"all"` means no filter).
    pub async fn bets(&self, status_filter: Option<&str>) -> Result<Vec<Bet>> {
        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.get_bets(&t, status_filter).await })
            .await
    }
}
