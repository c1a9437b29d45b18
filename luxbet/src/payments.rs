//! PIX deposits and withdrawals.
//!
//! Amounts are validated locally before anything is sent. Withdrawals are
//! checked against a freshly synced balance.

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::OnceCell;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsEvent, SharedSink};
use crate::balance::BalanceSynchronizer;
use crate::error::{LuxError, Result};
use crate::session::SessionStore;
use crate::types::{
    DepositRequest, Minimums, Notification, NotificationKind, PixKeyType, PixMetadata,
    TransactionStatus, UserProfile, WithdrawalBody, WithdrawalResponse,
};
use crate::utils::{
    extract_brl_amount, fold_accents, format_brl, parse_brl, to_decimal, to_f64,
};

/// `content_name` of the checkout event fired when a PIX charge is created.
pub const DEPOSIT_CONTENT_NAME: &str = "Depósito PIX";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Approved,
}

/// A PIX charge waiting to be paid. Replaced by the next deposit request.
#[derive(Debug, Clone, Serialize)]
pub struct DepositSession {
    pub id: Option<u64>,
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub pix_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub status: DepositStatus,
}

impl DepositSession {
    /// The copy-and-paste PIX code, exactly as issued by the backend.
    pub fn copy_code(&self) -> Option<&str> {
        self.pix_code.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_approved(&self) -> bool {
        self.status == DepositStatus::Approved
    }

    /// Whether `n` announces the approval of this deposit.
    pub fn is_confirmed_by(&self, n: &Notification) -> bool {
        if n.kind != NotificationKind::Success {
            return false;
        }
        let mentions_deposit = fold_accents(&n.title).contains("deposito")
            || fold_accents(&n.message).contains("deposito");
        mentions_deposit && extract_brl_amount(&n.message) == Some(self.amount)
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalRequest {
    /// Amount as typed, e.g. `"100,00"`.
    pub amount_input: String,
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    pub document_validation: Option<String>,
}

pub struct Payments {
    session: SessionStore,
    balance: BalanceSynchronizer,
    sink: SharedSink,
    minimums: OnceCell<Minimums>,
    poll_interval: std::time::Duration,
}

impl Payments {
    pub fn new(
        session: SessionStore,
        balance: BalanceSynchronizer,
        sink: SharedSink,
        poll_interval: std::time::Duration,
    ) -> Self {
        Self {
            session,
            balance,
            sink,
            minimums: OnceCell::new(),
            poll_interval,
        }
    }

    /// Deposit and withdrawal floors, fetched once. Any failure yields the defaults.
    pub async fn minimums(&self) -> Minimums {
        *self
            .minimums
            .get_or_init(|| async {
                match self.session.http().get_minimums().await {
                    Ok(m) => m.sanitized(),
                    Err(e) => {
                        debug!(error = %e, "minimums unavailable, using defaults");
                        Minimums::default()
                    }
                }
            })
            .await
    }

    /// Create a PIX charge for `amount_input`.
    ///
    /// Invalid or below-minimum amounts fail with [`LuxError::Validation`]
    /// and nothing is posted.
    pub async fn request_deposit(&self, amount_input: &str) -> Result<DepositSession> {
        if !self.session.is_authenticated() {
            return Err(LuxError::NotAuthenticated);
        }
        let amount = parse_positive(amount_input)?;

        let min = self.minimums().await.min_deposit;
        if amount < to_decimal(min) {
            return Err(LuxError::Validation(format!(
                "minimum deposit is {}",
                format_brl(to_decimal(min))
            )));
        }

        let user = self.current_user().await?;

        let body = DepositRequest {
            amount: to_f64(amount),
            payer_name: user.payer_name().to_string(),
            payer_tax_id: user.cpf.clone().unwrap_or_default(),
            payer_email: user.email.clone(),
            payer_phone: user.phone.clone().filter(|p| !p.is_empty()),
        };
        let http = self.session.http();
        let resp = self
            .session
            .authorized(|t| async move { http.create_pix_deposit(&t, &body).await })
            .await?;

        let metadata = match resp.metadata_json.as_deref() {
            Some(raw) => serde_json::from_str::<PixMetadata>(raw).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable PIX metadata");
                PixMetadata::default()
            }),
            None => PixMetadata::default(),
        };

        info!(amount = %amount, id = ?resp.id, "PIX deposit created");
        self.sink
            .track(AnalyticsEvent::initiate_checkout(amount, DEPOSIT_CONTENT_NAME));

        Ok(DepositSession {
            id: resp.id,
            amount,
            transaction_id: resp.transaction_id,
            pix_code: metadata.pix_code,
            qr_code_base64: metadata.pix_qr_code_base64,
            status: if resp.status == TransactionStatus::Approved {
                DepositStatus::Approved
            } else {
                DepositStatus::Pending
            },
        })
    }

    /// Wait until a success notification confirms `deposit`.
    ///
    /// Checks right away and then on every poll interval. On confirmation
    /// the deposit is marked approved and the profile refreshed. Returns
    /// `false` if cancelled first. Analytics for the approval are left to the
    /// notification poller.
    pub async fn await_deposit_confirmation(
        &self,
        deposit: &mut DepositSession,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        if deposit.is_approved() {
            self.refresh_quietly().await;
            return Ok(true);
        }

        let http = self.session.http();
        let mut interval = time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(false),
                _ = interval.tick() => {}
            }

            match self
                .session
                .authorized(|t| async move { http.get_notifications(&t).await })
                .await
            {
                Ok(list) => {
                    if list.iter().any(|n| deposit.is_confirmed_by(n)) {
                        deposit.status = DepositStatus::Approved;
                        info!(amount = %deposit.amount, "deposit confirmed");
                        self.refresh_quietly().await;
                        return Ok(true);
                    }
                }
                Err(e) if e.is_unauthorized() || matches!(e, LuxError::NotAuthenticated) => {
                    return Err(e)
                }
                Err(e) => debug!(error = %e, "deposit confirmation check failed"),
            }
        }
    }

    /// Request a PIX payout.
    ///
    /// Runs [`BalanceSynchronizer::ensure_synced`] before comparing, so funds
    /// held by the game provider are pulled back first.
    pub async fn request_withdrawal(&self, req: &WithdrawalRequest) -> Result<WithdrawalResponse> {
        if !self.session.is_authenticated() {
            return Err(LuxError::NotAuthenticated);
        }
        let amount = parse_positive(&req.amount_input)?;

        let min = self.minimums().await.min_withdrawal;
        if amount < to_decimal(min) {
            return Err(LuxError::Validation(format!(
                "minimum withdrawal is {}",
                format_brl(to_decimal(min))
            )));
        }
        let pix_key = req.pix_key.trim();
        if pix_key.is_empty() {
            return Err(LuxError::Validation("enter the destination PIX key".into()));
        }

        let value = to_f64(amount);
        let snapshot = self.balance.ensure_synced().await?;
        snapshot.check_withdrawable(value)?;

        let body = WithdrawalBody {
            amount: value,
            pix_key: pix_key.to_string(),
            pix_key_type: req.pix_key_type,
            document_validation: req
                .document_validation
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        let http = self.session.http();
        let resp = self
            .session
            .authorized(|t| async move { http.create_pix_withdrawal(&t, &body).await })
            .await?;
        info!(amount = %amount, id = ?resp.id, "PIX withdrawal requested");
        Ok(resp)
    }

    async fn current_user(&self) -> Result<UserProfile> {
        if let Some(user) = self.session.user() {
            return Ok(user);
        }
        self.session
            .refresh_user()
            .await?
            .ok_or(LuxError::NotAuthenticated)
    }

    async fn refresh_quietly(&self) {
        if let Err(e) = self.session.refresh_user().await {
            debug!(error = %e, "profile refresh failed");
        }
    }
}

fn parse_positive(input: &str) -> Result<Decimal> {
    match parse_brl(input) {
        Some(v) if v > Decimal::ZERO => Ok(v),
        _ => Err(LuxError::Validation(
            "invalid amount: enter a value greater than zero".into(),
        )),
    }
}
