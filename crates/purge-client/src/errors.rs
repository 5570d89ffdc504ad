use thiserror::Error;

/// Failure of a single remote call.
///
/// Only two classes matter to callers: a permanent denial is never retried, everything else
/// is transient and retried after a delay. The remote does not reliably tell rate limiting
/// apart from server errors, so both end up as [`ClientError::TransientFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("access denied by the remote")]
    PermanentDenial,

    #[error("transient failure: {0}")]
    TransientFailure(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, ClientError::PermanentDenial)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::TransientFailure(format!("http request failed: {e}"))
    }
}
