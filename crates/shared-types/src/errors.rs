//! # Error Types
//!
//! Parsing errors for the shared primitives.

use thiserror::Error;

/// Errors raised when building an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Identifier is empty.
    #[error("{kind} id must not be empty")]
    Empty { kind: &'static str },

    /// Identifier exceeds the maximum length.
    #[error("{kind} id too long: {actual} chars (max {max})")]
    TooLong {
        kind: &'static str,
        max: usize,
        actual: usize,
    },

    /// Identifier contains whitespace, a control character or the hash separator.
    #[error("{kind} id contains invalid character {character:?}")]
    InvalidCharacter { kind: &'static str, character: char },
}

/// Errors raised when parsing a hex-encoded hash.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    /// Wrong number of hex characters.
    #[error("invalid hash length: expected {expected} hex chars, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}
