//! Fetch error types

use std::fmt;

use thiserror::Error;

use super::Dataset;

/// Failure class of a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request did not complete with a success status
    Transport,
    /// The body is not JSON
    Parse,
    /// JSON that does not have the expected structure
    Schema,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::Transport => "transport",
            FetchErrorKind::Parse => "parse",
            FetchErrorKind::Schema => "schema",
        };
        f.write_str(name)
    }
}

/// A failed fetch of one dataset
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} error fetching {dataset}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub dataset: Dataset,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, dataset: Dataset, message: impl Into<String>) -> Self {
        Self {
            kind,
            dataset,
            message: message.into(),
        }
    }

    pub fn transport(dataset: Dataset, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transport, dataset, message)
    }

    pub fn parse(dataset: Dataset, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Parse, dataset, message)
    }

    pub fn schema(dataset: Dataset, message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Schema, dataset, message)
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
