//! Provider-specific error types.

use thiserror::Error;

/// Errors from calls to the external chat provider.
///
/// The sync worker treats every variant the same way — log, report, leave
/// local state untouched — so the taxonomy exists for observability, not for
/// branching recovery logic.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider call timed out")]
    Timeout,

    #[error("provider is not reachable: {0}")]
    Unreachable(String),

    #[error("provider rejected the call with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("provider returned an unexpected response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return ProviderError::Timeout;
        }
        if let Some(status) = e.status() {
            return ProviderError::Rejected { status: status.as_u16(), message: e.to_string() };
        }
        ProviderError::Unreachable(e.to_string())
    }
}
