use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited, retry in {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl Error {
    /// Errors that no amount of retrying will fix without a new sign in.
    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::SessionExpired | Error::Forbidden(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. } | Error::Server { .. } | Error::Transport(_) | Error::Decode(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.is_decode() {
            true => Error::Decode(err.to_string()),
            false => Error::Transport(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(Error::SessionExpired.is_session_error());
        assert!(!Error::SessionExpired.is_transient());
        assert!(Error::Server {
            status: 502,
            message: "Bad Gateway".to_string()
        }
        .is_transient());
        assert!(!Error::Validation {
            status: 400,
            message: "Amount out of range".to_string()
        }
        .is_transient());
    }
}
