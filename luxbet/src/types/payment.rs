use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::transaction::TransactionStatus;

pub const DEFAULT_MIN_DEPOSIT: f64 = 2.0;
pub const DEFAULT_MIN_WITHDRAWAL: f64 = 10.0;

/// `/api/public/minimums`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Minimums {
    #[serde(default = "default_min_deposit")]
    pub min_deposit: f64,
    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: f64,
}

impl Default for Minimums {
    fn default() -> Self {
        Self {
            min_deposit: DEFAULT_MIN_DEPOSIT,
            min_withdrawal: DEFAULT_MIN_WITHDRAWAL,
        }
    }
}

impl Minimums {
    /// Replace non-positive or non-finite limits with the defaults.
    pub fn sanitized(self) -> Self {
        let pick = |v: f64, d: f64| if v.is_finite() && v > 0.0 { v } else { d };
        Self {
            min_deposit: pick(self.min_deposit, DEFAULT_MIN_DEPOSIT),
            min_withdrawal: pick(self.min_withdrawal, DEFAULT_MIN_WITHDRAWAL),
        }
    }
}

fn default_min_deposit() -> f64 {
    DEFAULT_MIN_DEPOSIT
}

fn default_min_withdrawal() -> f64 {
    DEFAULT_MIN_WITHDRAWAL
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    pub amount: f64,
    pub payer_name: String,
    /// Empty lets the backend generate a document.
    pub payer_tax_id: String,
    pub payer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub amount: f64,
    #[serde(default = "pending")]
    pub status: TransactionStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// JSON-encoded [`PixMetadata`].
    #[serde(default)]
    pub metadata_json: Option<String>,
}

fn pending() -> TransactionStatus {
    TransactionStatus::Pending
}

/// Decoded `metadata_json` of a PIX deposit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PixMetadata {
    #[serde(default)]
    pub pix_code: Option<String>,
    #[serde(default)]
    pub pix_qr_code_base64: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum PixKeyType {
    #[default]
    PhoneNumber,
    Email,
    Document,
    RandomKey,
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PixKeyType::PhoneNumber => "phoneNumber",
            PixKeyType::Email => "email",
            PixKeyType::Document => "document",
            PixKeyType::RandomKey => "randomKey",
        };
        f.write_str(s)
    }
}

impl FromStr for PixKeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "phonenumber" | "phone" => Ok(PixKeyType::PhoneNumber),
            "email" => Ok(PixKeyType::Email),
            "document" | "cpf" | "cnpj" => Ok(PixKeyType::Document),
            "randomkey" | "random" => Ok(PixKeyType::RandomKey),
            other => Err(format!("unknown PIX key type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalBody {
    pub amount: f64,
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_validation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "pending")]
    pub status: TransactionStatus,
    #[serde(default)]
    pub transaction_id: Option<String>,
}
