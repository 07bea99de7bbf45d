use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid filter {0:?}: expected key:value")]
    InvalidFilter(String),
}
