//! Error types for the measurement core

use thiserror::Error;

/// Errors surfaced by the measurement core
///
/// These always indicate a caller bug (bad input), never a transient
/// condition, so nothing in the core retries on them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfilerError {
    /// A computation was requested outside its mathematical domain
    #[error("domain error: {0}")]
    Domain(String),

    /// An argument failed validation
    #[error("{0}")]
    InvalidArgument(String),
}

impl ProfilerError {
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ProfilerError>;
