//! Notification polling.
//!
//! Every cycle surfaces at most one unread notification that this process has
//! not shown before. Deposit approvals also refresh the balance and feed the
//! analytics sink.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsEvent, SharedSink};
use crate::error::Result;
use crate::session::{Session, SessionStore};
use crate::types::{Notification, Transaction};
use crate::utils::{extract_brl_amount, fold_accents, to_decimal};

/// `content_name` of the lead event fired for a first deposit.
pub const FIRST_DEPOSIT_LEAD: &str = "First Time Deposit";

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// Show this notification.
    Shown(Notification),
    /// Hide the notification with this id.
    Dismissed(u64),
}

struct PollerInner {
    session: SessionStore,
    sink: SharedSink,
    seen: Mutex<HashSet<u64>>,
    tx: broadcast::Sender<NotificationEvent>,
    interval: Duration,
    dismiss_after: Duration,
}

#[derive(Clone)]
pub struct NotificationPoller {
    inner: Arc<PollerInner>,
}

impl NotificationPoller {
    pub fn new(
        session: SessionStore,
        sink: SharedSink,
        interval: Duration,
        dismiss_after: Duration,
    ) -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(PollerInner {
                session,
                sink,
                seen: Mutex::new(HashSet::new()),
                tx,
                interval,
                dismiss_after,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.tx.subscribe()
    }

    /// Whether `id` was already surfaced by this poller.
    pub fn has_seen(&self, id: u64) -> bool {
        self.lock_seen().contains(&id)
    }

    /// Run one poll cycle and return the notification surfaced, if any.
    ///
    /// The mark-read call and the dismiss timer run as detached tasks;
    /// `cancel` stops the timer.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> Result<Option<Notification>> {
        let session = &self.inner.session;
        let http = session.http();
        let list = session
            .authorized(|t| async move { http.get_notifications(&t).await })
            .await?;

        let picked = {
            let mut seen = self.lock_seen();
            let picked = select_next(&list, &seen).cloned();
            if let Some(n) = &picked {
                seen.insert(n.id);
            }
            picked
        };
        let Some(notification) = picked else {
            return Ok(None);
        };

        info!(id = notification.id, title = %notification.title, "notification");
        let _ = self
            .inner
            .tx
            .send(NotificationEvent::Shown(notification.clone()));
        self.spawn_mark_read(notification.id);
        self.spawn_dismiss(notification.id, cancel.clone());

        if is_deposit_notification(&notification) {
            self.track_deposit(&notification).await;
        }

        Ok(Some(notification))
    }

    /// Spawn the poll loop.
    ///
    /// Polls immediately, then every interval while authenticated; a login
    /// triggers an immediate poll. Errors are logged and swallowed.
    pub fn start(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let poller = self.clone();

        tokio::spawn(async move {
            let mut rx = poller.inner.session.subscribe();
            let mut interval = time::interval(poller.inner.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                if !rx.borrow_and_update().is_authenticated() {
                    if !wait_for_login(&mut rx, &cancel).await {
                        break;
                    }
                    interval.reset_immediately();
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }

                if let Err(e) = poller.poll_once(&cancel).await {
                    debug!(error = %e, "notification poll failed");
                }
            }
            debug!("notification poller stopped");
        })
    }

    fn lock_seen(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.inner.seen.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn spawn_mark_read(&self, id: u64) {
        let session = self.inner.session.clone();
        tokio::spawn(async move {
            let http = session.http();
            if let Err(e) = session
                .authorized(|t| async move { http.mark_notification_read(&t, id).await })
                .await
            {
                debug!(id, error = %e, "mark-read failed");
            }
        });
    }

    fn spawn_dismiss(&self, id: u64, cancel: CancellationToken) {
        let tx = self.inner.tx.clone();
        let after = self.inner.dismiss_after;
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(after) => {
                    let _ = tx.send(NotificationEvent::Dismissed(id));
                }
                _ = cancel.cancelled() => {}
            }
        });
    }

    /// Refresh the balance and report the purchase for an approved deposit.
    ///
    /// The amount comes from the newest approved deposit in the transaction
    /// history; when that is unavailable it is parsed from the message.
    async fn track_deposit(&self, notification: &Notification) {
        let session = &self.inner.session;
        if let Err(e) = session.refresh_user().await {
            debug!(error = %e, "balance refresh after deposit failed");
        }

        let http = session.http();
        match session
            .authorized(|t| async move { http.get_transactions(&t).await })
            .await
        {
            Ok(transactions) => {
                if let Some((value, first)) = latest_approved_deposit(&transactions) {
                    info!(%value, first_deposit = first, "deposit approved");
                    self.inner.sink.track(AnalyticsEvent::purchase(value, first));
                    if first {
                        self.inner
                            .sink
                            .track(AnalyticsEvent::lead(value, FIRST_DEPOSIT_LEAD));
                    }
                    return;
                }
                debug!("no approved deposit in history");
            }
            Err(e) => warn!(error = %e, "transaction lookup failed"),
        }

        match extract_brl_amount(&notification.message) {
            Some(value) => {
                info!(%value, "deposit approved (amount from message)");
                self.inner.sink.track(AnalyticsEvent::purchase(value, false));
            }
            None => debug!(id = notification.id, "deposit amount not found"),
        }
    }
}

async fn wait_for_login(rx: &mut watch::Receiver<Session>, cancel: &CancellationToken) -> bool {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return false,
            changed = rx.changed() => {
                if changed.is_err() {
                    return false;
                }
                if rx.borrow_and_update().is_authenticated() {
                    return true;
                }
            }
        }
    }
}

/// First unread notification not surfaced before.
pub fn select_next<'a>(list: &'a [Notification], seen: &HashSet<u64>) -> Option<&'a Notification> {
    list.iter().find(|n| !n.is_read && !seen.contains(&n.id))
}

/// Whether the notification announces a deposit (accent and case tolerant).
pub fn is_deposit_notification(n: &Notification) -> bool {
    fold_accents(&n.title).contains("deposito") || fold_accents(&n.message).contains("deposito")
}

/// Amount of the newest approved deposit, and whether it is the only one.
pub fn latest_approved_deposit(transactions: &[Transaction]) -> Option<(Decimal, bool)> {
    let approved: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.is_approved_deposit())
        .collect();
    let latest = approved
        .iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at))?;
    Some((to_decimal(latest.amount), approved.len() == 1))
}
