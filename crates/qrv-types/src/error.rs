use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("scan id must not be empty")]
    EmptyId,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
