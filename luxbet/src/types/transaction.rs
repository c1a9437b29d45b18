use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Processing,
    #[serde(other)]
    Other,
}

/// One row of `/api/auth/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Transaction {
    pub fn is_approved_deposit(&self) -> bool {
        self.kind == TransactionKind::Deposit && self.status == TransactionStatus::Approved
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionList {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// One row of `/api/auth/bets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: u64,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub win_amount: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Bet {
    pub fn display_name(&self) -> &str {
        self.game_name
            .as_deref()
            .or(self.game_id.as_deref())
            .unwrap_or("Jogo desconhecido")
    }
}
