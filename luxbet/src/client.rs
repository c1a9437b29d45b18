use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analytics::SharedSink;
use crate::balance::{BalanceSnapshot, BalanceSynchronizer};
use crate::config::LuxConfig;
use crate::content::Content;
use crate::error::Result;
use crate::games::Games;
use crate::history::History;
use crate::notifications::NotificationPoller;
use crate::payments::Payments;
use crate::referral::{self, Referral};
use crate::rest::LuxHttpClient;
use crate::session::{LoginOutcome, SessionStore};
use crate::storage::TokenStore;
use crate::types::{RegisterData, UserProfile};

/// Main LuxBet client: one session plus the services built on it.
#[derive(Clone)]
pub struct LuxClient {
    /// Configuration the client was built from.
    pub config: LuxConfig,
    /// HTTP client.
    pub http_client: LuxHttpClient,
    session: SessionStore,
    balance: BalanceSynchronizer,
    payments: Arc<Payments>,
    sink: SharedSink,
}

impl LuxClient {
    /// Build the client. Picks up a persisted token but does not fetch the profile.
    pub fn new(config: LuxConfig, tokens: Arc<dyn TokenStore>, sink: SharedSink) -> Result<Self> {
        let http_client = LuxHttpClient::new(&config)?;
        let session = SessionStore::new(http_client.clone(), tokens, config.refresh_interval);
        let balance = BalanceSynchronizer::new(session.clone());
        let payments = Arc::new(Payments::new(
            session.clone(),
            balance.clone(),
            sink.clone(),
            config.deposit_poll_interval,
        ));
        Ok(Self {
            config,
            http_client,
            session,
            balance,
            payments,
            sink,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn balance(&self) -> &BalanceSynchronizer {
        &self.balance
    }

    pub fn payments(&self) -> &Payments {
        &self.payments
    }

    pub fn games(&self) -> Games {
        Games::new(
            self.session.clone(),
            self.balance.clone(),
            self.config.in_game_sync_interval,
        )
    }

    pub fn referral(&self) -> Referral {
        Referral::new(self.session.clone())
    }

    pub fn content(&self) -> Content {
        Content::new(self.http_client.clone())
    }

    pub fn history(&self) -> History {
        History::new(self.session.clone())
    }

    /// A fresh poller with its own seen-set.
    pub fn notification_poller(&self) -> NotificationPoller {
        NotificationPoller::new(
            self.session.clone(),
            self.sink.clone(),
            self.config.notification_interval,
            self.config.notification_dismiss,
        )
    }

    // --- Session shortcuts ---

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        self.session.login(username, password).await
    }

    pub async fn register(&self, data: &RegisterData) -> Result<LoginOutcome> {
        self.session.register(data).await
    }

    pub fn logout(&self) -> Result<()> {
        self.session.logout()
    }

    pub async fn refresh_user(&self) -> Result<Option<UserProfile>> {
        self.session.refresh_user().await
    }

    pub async fn ensure_synced(&self) -> Result<BalanceSnapshot> {
        self.balance.ensure_synced().await
    }

    /// Invite link on the configured page origin, if there is one.
    pub fn referral_link(&self, code: &str) -> Option<String> {
        self.http_client
            .resolver()
            .same_origin()
            .map(|origin| referral::referral_link(&origin, code))
    }

    /// Spawn the profile refresh and the notification poller.
    pub fn start_background(
        &self,
        poller: &NotificationPoller,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        vec![
            self.session.start_background_refresh(cancel.clone()),
            poller.start(cancel),
        ]
    }
}
