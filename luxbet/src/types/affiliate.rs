use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// `/api/public/affiliate/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliate {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    pub affiliate_code: String,
    /// Fixed commission per qualifying referred depositor.
    #[serde(default)]
    pub cpa_amount: f64,
    #[serde(default)]
    pub revshare_percentage: f64,
    #[serde(default)]
    pub total_referrals: u64,
    #[serde(default)]
    pub total_cpa_earned: f64,
    #[serde(default)]
    pub total_revshare_earned: f64,
    #[serde(default)]
    pub total_deposits: f64,
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    ThisWeek,
    LastWeek,
    #[default]
    ThisMonth,
    LastMonth,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::ThisWeek => "this_week",
            Period::LastWeek => "last_week",
            Period::ThisMonth => "this_month",
            Period::LastMonth => "last_month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "this_week" => Ok(Period::ThisWeek),
            "last_week" => Ok(Period::LastWeek),
            "this_month" => Ok(Period::ThisMonth),
            "last_month" => Ok(Period::LastMonth),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

/// `/api/public/affiliate/meus-dados?period=...`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffiliateMetrics {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub novos_subordinados: u64,
    #[serde(default)]
    pub depositos: u64,
    #[serde(default)]
    pub primeiros_depositos: u64,
    #[serde(default)]
    pub usuarios_registrados_com_1_deposito: u64,
    #[serde(default)]
    pub valor_deposito: f64,
    #[serde(default)]
    pub valor_primeiro_deposito: f64,
    #[serde(default)]
    pub registro_e_1_deposito: f64,
    #[serde(default)]
    pub valor_saque: f64,
    #[serde(default)]
    pub numero_saques: u64,
    #[serde(default)]
    pub receber_recompensas: f64,
    #[serde(default)]
    pub apostas_validas: f64,
    /// Direct win/loss; negative when referred players are net winners.
    #[serde(default)]
    pub vd_diretas: f64,
}

/// `/api/public/manager/dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerDashboard {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub cpa_pool: f64,
    #[serde(default)]
    pub revshare_percentage: f64,
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub total_cpa_earned: f64,
    #[serde(default)]
    pub total_revshare_earned: f64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub sub_affiliates_count: u64,
    #[serde(default)]
    pub cpa_distributed: f64,
}

/// Row of `/api/public/manager/sub-affiliates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubAffiliate {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub affiliate_code: String,
    #[serde(default)]
    pub cpa_amount: f64,
    #[serde(default)]
    pub revshare_percentage: f64,
    #[serde(default)]
    pub total_referrals: u64,
    #[serde(default)]
    pub total_deposits: f64,
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubAffiliate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub affiliate_code: String,
    pub cpa_amount: f64,
    pub revshare_percentage: f64,
}
