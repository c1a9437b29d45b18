//! Affiliate and manager (referral program) views.

use tracing::info;

use crate::error::{LuxError, Result};
use crate::session::SessionStore;
use crate::types::{
    Affiliate, AffiliateMetrics, ManagerDashboard, NewSubAffiliate, Period, SubAffiliate,
};

/// Invite link for an affiliate code: `{origin}?ref={code}`.
pub fn referral_link(origin: &str, code: &str) -> String {
    format!("{}?ref={}", origin.trim_end_matches('/'), code)
}

#[derive(Debug, Clone)]
pub struct Referral {
    session: SessionStore,
}

impl Referral {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// The caller's affiliate record; [`LuxError::NotAffiliate`] if there is none.
    pub async fn affiliate_dashboard(&self) -> Result<Affiliate> {
        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.get_affiliate_dashboard(&t).await })
            .await
            .map_err(|e| match e {
                LuxError::NotFound(_) => LuxError::NotAffiliate,
                other => other,
            })
    }

    pub async fn affiliate_metrics(&self, period: Period) -> Result<AffiliateMetrics> {
        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.get_affiliate_metrics(&t, period).await })
            .await
    }

    /// The caller's manager record; [`LuxError::NotManager`] if there is none.
    pub async fn manager_dashboard(&self) -> Result<ManagerDashboard> {
        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.get_manager_dashboard(&t).await })
            .await
            .map_err(|e| match e {
                LuxError::NotFound(_) => LuxError::NotManager,
                other => other,
            })
    }

    pub async fn sub_affiliates(&self) -> Result<Vec<SubAffiliate>> {
        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.get_sub_affiliates(&t).await })
            .await
    }

    /// Create a sub-affiliate under the caller. Backend rejections come back
    /// with the backend's message.
    pub async fn create_sub_affiliate(&self, sub: &NewSubAffiliate) -> Result<()> {
        for (field, value) in [
            ("username", &sub.username),
            ("email", &sub.email),
            ("password", &sub.password),
            ("affiliate_code", &sub.affiliate_code),
        ] {
            if value.trim().is_empty() {
                return Err(LuxError::Validation(format!("{field} is required")));
            }
        }
        if sub.cpa_amount < 0.0 || !(0.0..=100.0).contains(&sub.revshare_percentage) {
            return Err(LuxError::Validation(
                "CPA must be non-negative and revshare between 0 and 100".into(),
            ));
        }

        let http = self.session.http();
        self.session
            .authorized(|t| async move { http.create_sub_affiliate(&t, sub).await })
            .await?;
        info!(code = %sub.affiliate_code, "sub-affiliate created");
        Ok(())
    }
}
