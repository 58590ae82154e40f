use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The member, role or channel does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The bot lacks permission (e.g. the role sits above the bot's own).
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("platform request failed: {0}")]
    RequestFailed(String),

    #[error("platform unreachable: {0}")]
    Unreachable(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SinkError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            SinkError::Unreachable(format!("connection failed: {e}"))
        } else {
            SinkError::RequestFailed(e.to_string())
        }
    }
}
