use reqwest::{Method, Response};

use crate::error::{LuxError, Result};
use crate::rest::{parse_detail, LuxHttpClient, RequestOptions};
use crate::types::*;

/// Shown when the login endpoint rejects without a `detail`.
pub const LOGIN_FAILED: &str = "Erro ao fazer login";
/// Shown when the register endpoint rejects without a `detail`.
pub const REGISTER_FAILED: &str = "Erro ao criar conta";

impl LuxHttpClient {
    // --- Auth ---

    /// POST /api/auth/login - Exchange credentials for a bearer token.
    ///
    /// Any non-2xx answer is a rejection and becomes [`LuxError::Auth`].
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let opts = RequestOptions::new().json(&LoginRequest { username, password })?;
        let resp = self.request(Method::POST, "/api/auth/login", opts).await?;
        let body = credential_body(resp, LOGIN_FAILED).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST /api/auth/register - Create an account. Does not log in.
    pub async fn register(&self, data: &RegisterData) -> Result<()> {
        let opts = RequestOptions::new().json(data)?;
        let resp = self.request(Method::POST, "/api/auth/register", opts).await?;
        credential_body(resp, REGISTER_FAILED).await.map(|_| ())
    }

    /// GET /api/auth/me?t= - Current user profile, cache-busted.
    pub async fn get_me(&self, token: &str) -> Result<UserProfile> {
        let t = chrono::Utc::now().timestamp_millis();
        self.get(
            "/api/auth/me",
            RequestOptions::new().bearer(token).query("t", t),
        )
        .await
    }

    // --- Balance ---

    /// GET /api/auth/available-balance - Withdrawable balance and sync flag.
    pub async fn get_available_balance(&self, token: &str) -> Result<AvailableBalance> {
        self.get(
            "/api/auth/available-balance",
            RequestOptions::new().bearer(token),
        )
        .await
    }

    /// POST /api/public/games/sync-balance - Pull funds back from the game provider.
    ///
    /// Idempotent on the backend; safe to repeat.
    pub async fn sync_balance(&self, token: &str) -> Result<SyncBalanceResult> {
        self.post(
            "/api/public/games/sync-balance",
            RequestOptions::new().bearer(token),
        )
        .await
    }

    // --- History ---

    /// GET /api/auth/transactions - Deposits and withdrawals.
    pub async fn get_transactions(&self, token: &str) -> Result<Vec<Transaction>> {
        let list: TransactionList = self
            .get("/api/auth/transactions", RequestOptions::new().bearer(token))
            .await?;
        Ok(list.transactions)
    }

    /// GET /api/auth/bets?status_filter= - Bet history, optionally filtered.
    pub async fn get_bets(&self, token: &str, status_filter: Option<&str>) -> Result<Vec<Bet>> {
        let mut opts = RequestOptions::new().bearer(token);
        if let Some(status) = status_filter.filter(|s| !s.is_empty() && *s != "all") {
            opts = opts.query("status_filter", status);
        }
        self.get("/api/auth/bets", opts).await
    }

    // --- Notifications ---

    /// GET /api/public/notifications - Newest first.
    pub async fn get_notifications(&self, token: &str) -> Result<Vec<Notification>> {
        self.get(
            "/api/public/notifications",
            RequestOptions::new().bearer(token),
        )
        .await
    }

    /// PUT /api/public/notifications/{id}/read - Mark one notification read.
    pub async fn mark_notification_read(&self, token: &str, id: u64) -> Result<()> {
        self.put_unit(
            &format!("/api/public/notifications/{id}/read"),
            RequestOptions::new().bearer(token),
        )
        .await
    }

    // --- Games ---

    /// GET /api/public/games - Catalog and provider order.
    pub async fn get_games(&self) -> Result<GameList> {
        self.get("/api/public/games", RequestOptions::new()).await
    }

    /// GET /api/public/games/{code}/launch?lang=pt - Start a game session.
    pub async fn launch_game(&self, token: &str, code: &str) -> Result<GameLaunch> {
        self.get(
            &format!("/api/public/games/{code}/launch"),
            RequestOptions::new().bearer(token).query("lang", "pt"),
        )
        .await
    }

    // --- Payments ---

    /// POST /api/public/payments/deposit/pix - Create a PIX charge.
    pub async fn create_pix_deposit(
        &self,
        token: &str,
        body: &DepositRequest,
    ) -> Result<DepositResponse> {
        self.post(
            "/api/public/payments/deposit/pix",
            RequestOptions::new().bearer(token).json(body)?,
        )
        .await
    }

    /// POST /api/public/payments/withdrawal/pix - Request a PIX payout.
    pub async fn create_pix_withdrawal(
        &self,
        token: &str,
        body: &WithdrawalBody,
    ) -> Result<WithdrawalResponse> {
        self.post(
            "/api/public/payments/withdrawal/pix",
            RequestOptions::new().bearer(token).json(body)?,
        )
        .await
    }

    // --- Content ---

    /// GET /api/public/minimums - Deposit and withdrawal floors.
    pub async fn get_minimums(&self) -> Result<Minimums> {
        self.get("/api/public/minimums", RequestOptions::new()).await
    }

    /// GET /api/public/promotions?featured=&limit=
    pub async fn get_promotions(&self, featured: bool, limit: u32) -> Result<Vec<Promotion>> {
        let mut opts = RequestOptions::new();
        if featured {
            opts = opts.query("featured", "true");
        }
        let payload: PromotionPayload = self
            .get("/api/public/promotions", opts.query("limit", limit))
            .await?;
        Ok(payload.into_vec())
    }

    /// GET /api/public/support-config
    pub async fn get_support_config(&self) -> Result<SupportConfig> {
        self.get("/api/public/support-config", RequestOptions::new())
            .await
    }

    /// GET /api/public/media/logo - Site logo path, if one is uploaded.
    pub async fn get_logo(&self) -> Result<LogoResponse> {
        self.get("/api/public/media/logo", RequestOptions::new())
            .await
    }

    /// GET /api/public/tracking-config?platform= - Pixel settings.
    pub async fn get_tracking_config(&self, platform: &str) -> Result<TrackingConfig> {
        self.get(
            "/api/public/tracking-config",
            RequestOptions::new().query("platform", platform),
        )
        .await
    }

    // --- Referral ---

    /// GET /api/public/affiliate/dashboard - 404 when the user is not an affiliate.
    pub async fn get_affiliate_dashboard(&self, token: &str) -> Result<Affiliate> {
        self.get(
            "/api/public/affiliate/dashboard",
            RequestOptions::new().bearer(token),
        )
        .await
    }

    /// GET /api/public/affiliate/meus-dados?period= - Period metrics.
    pub async fn get_affiliate_metrics(
        &self,
        token: &str,
        period: Period,
    ) -> Result<AffiliateMetrics> {
        self.get(
            "/api/public/affiliate/meus-dados",
            RequestOptions::new()
                .bearer(token)
                .query("period", period.as_str()),
        )
        .await
    }

    /// GET /api/public/manager/dashboard - 404 when the user is not a manager.
    pub async fn get_manager_dashboard(&self, token: &str) -> Result<ManagerDashboard> {
        self.get(
            "/api/public/manager/dashboard",
            RequestOptions::new().bearer(token),
        )
        .await
    }

    /// GET /api/public/manager/sub-affiliates
    pub async fn get_sub_affiliates(&self, token: &str) -> Result<Vec<SubAffiliate>> {
        self.get(
            "/api/public/manager/sub-affiliates",
            RequestOptions::new().bearer(token),
        )
        .await
    }

    /// POST /api/public/manager/sub-affiliates - Create a sub-affiliate account.
    pub async fn create_sub_affiliate(
        &self,
        token: &str,
        body: &NewSubAffiliate,
    ) -> Result<()> {
        self.post_unit(
            "/api/public/manager/sub-affiliates",
            RequestOptions::new().bearer(token).json(body)?,
        )
        .await
    }
}

async fn credential_body(resp: Response, fallback: &str) -> Result<Vec<u8>> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        let detail = parse_detail(&String::from_utf8_lossy(&body))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(LuxError::Auth(detail));
    }
    Ok(body.to_vec())
}
