use thiserror::Error;

#[derive(Error, Debug)]
pub enum LuxError {
    /// Every candidate base URL failed at the transport level.
    #[error("transport error after {attempts} attempt(s): {source}")]
    Transport {
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("unauthorized ({status}): {detail}")]
    Unauthorized { status: u16, detail: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP error {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Validation(String),

    #[error("not logged in")]
    NotAuthenticated,

    #[error("insufficient balance: R$ {available:.2} available")]
    InsufficientBalance { available: f64 },

    #[error("insufficient balance right now: R$ {total:.2} in total, sync still pending")]
    SyncPending { total: f64 },

    #[error("not an affiliate")]
    NotAffiliate,

    #[error("not a manager")]
    NotManager,

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl LuxError {
    /// Whether this error is an authoritative rejection of the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, LuxError::Unauthorized { .. })
    }

    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            LuxError::Api { detail, .. }
            | LuxError::Unauthorized { detail, .. }
            | LuxError::NotFound(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LuxError>;
