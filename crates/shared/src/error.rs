use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionErrorKind {
    /// No usable reading yet; the source keeps trying.
    TemporarilyUnavailable,
    ServicesDisabled,
    Denied,
    Network,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind:?}: {message}")]
pub struct PositionError {
    pub kind: PositionErrorKind,
    pub message: String,
}

impl PositionError {
    pub fn new(kind: PositionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn temporarily_unavailable() -> Self {
        Self::new(
            PositionErrorKind::TemporarilyUnavailable,
            "position currently unknown",
        )
    }

    /// Transient readings-not-ready condition; the request stays active
    /// and the error is never surfaced.
    pub fn is_transient(&self) -> bool {
        self.kind == PositionErrorKind::TemporarilyUnavailable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressErrorKind {
    Network,
    /// The lookup succeeded but returned no candidates.
    EmptyResult,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind:?}: {message}")]
pub struct AddressError {
    pub kind: AddressErrorKind,
    pub message: String,
}

impl AddressError {
    pub fn new(kind: AddressErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn empty_result() -> Self {
        Self::new(AddressErrorKind::EmptyResult, "no address candidates found")
    }
}
