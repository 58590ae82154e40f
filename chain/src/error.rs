use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("RPC request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from RPC endpoint: {0}")]
    InvalidResponse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChainError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ChainError::Unreachable(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ChainError::InvalidResponse(e.to_string())
        } else {
            ChainError::RequestFailed(e.to_string())
        }
    }
}
