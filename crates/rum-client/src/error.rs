//! Error types for event reporting.
//!
//! Every failure a report can end in is one of three kinds: the caller's
//! input was rejected up front, the transport failed, or the collector
//! replied with an exception.

use crate::constants::INVALID_ARGUMENT_CODE;
use crate::transport::TransportError;

/// Result type for reporting operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Coarse classification of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    TransportFailure,
    RemoteRejected,
}

/// Errors that can end a report
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    /// Malformed caller input; nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The transport failed before a reply arrived.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The collector received the batch and refused it.
    #[error("[Exception] code: {code}, ex: {message}")]
    RemoteRejected {
        /// Collector's error code
        code: i64,
        /// Collector's error text
        message: String,
    },
}

impl ReportError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Transport(_) => ErrorKind::TransportFailure,
            Self::RemoteRejected { .. } => ErrorKind::RemoteRejected,
        }
    }

    /// Numeric code as passed to completion handlers.
    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidArgument(_) => INVALID_ARGUMENT_CODE,
            Self::Transport(e) => e.code(),
            Self::RemoteRejected { code, .. } => *code,
        }
    }

    /// Message as passed to completion handlers.
    ///
    /// Transport failures carry an empty message, matching what the
    /// collector's other SDKs report for them.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidArgument(msg) => msg.clone(),
            Self::Transport(_) => String::new(),
            Self::RemoteRejected { message, .. } => message.clone(),
        }
    }
}
