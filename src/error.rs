use luxbet::LuxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", .0.user_message())]
    Lux(#[from] LuxError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    NotFound(String),
}
