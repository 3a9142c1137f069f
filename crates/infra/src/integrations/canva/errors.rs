//! Canva-specific error classification
//!
//! Transport and API failures are classified here and translated into the
//! domain taxonomy before they cross the integration boundary; no raw
//! `reqwest` error escapes this module.

use std::fmt;

use reqwest::StatusCode;
use roamly_domain::ExportError;

/// Error raised by the Canva client before domain translation.
#[derive(Debug)]
pub enum CanvaError {
    /// The request did not complete within its timeout.
    Timeout(String),

    /// The platform (or an image host) was unreachable.
    Connect(String),

    /// The platform answered with a non-success status.
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Machine-readable error code from the response body, when present.
        code: Option<String>,
        /// Human-readable message from the response body, when present.
        message: Option<String>,
    },

    /// The response body could not be decoded.
    Decode(String),

    /// Any other transport failure.
    Transport(String),
}

impl CanvaError {
    /// Build a status error from an HTTP status plus optional body fields.
    #[must_use]
    pub fn status(status: StatusCode, code: Option<String>, message: Option<String>) -> Self {
        Self::Status { status, code, message }
    }
}

impl fmt::Display for CanvaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(detail) => write!(f, "canva request timed out: {detail}"),
            Self::Connect(detail) => write!(f, "canva unreachable: {detail}"),
            Self::Status { status, code, message } => {
                write!(f, "canva API error {}", status.as_u16())?;
                if let Some(code) = code {
                    write!(f, " [{code}]")?;
                }
                if let Some(message) = message {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            Self::Decode(detail) => write!(f, "canva response not understood: {detail}"),
            Self::Transport(detail) => write!(f, "canva transport error: {detail}"),
        }
    }
}

impl std::error::Error for CanvaError {}

impl From<reqwest::Error> for CanvaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Every platform failure surfaces to callers as a network-kind error; the
/// message keeps the status/code detail for the redirect and the logs.
impl From<CanvaError> for ExportError {
    fn from(err: CanvaError) -> Self {
        Self::Network(err.to_string())
    }
}
