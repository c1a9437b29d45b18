use serde::{Deserialize, Serialize};

/// `/api/auth/available-balance`.
///
/// `needs_sync` is set while part of the player's funds sit with the game
/// provider (transfer mode) and must be pulled back before they count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableBalance {
    #[serde(default)]
    pub available_balance: Option<f64>,
    #[serde(default)]
    pub total_balance: Option<f64>,
    #[serde(default)]
    pub our_balance: Option<f64>,
    #[serde(default)]
    pub needs_sync: bool,
}

/// `/api/public/games/sync-balance`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncBalanceResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub balance: Option<f64>,
}
