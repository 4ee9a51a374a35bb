//! # Core Domain Entities
//!
//! Identifiers and hash primitives shared by the certificate subsystems.
//!
//! ## Clusters
//!
//! - **Hashes**: `Hash`, hex encoding helpers
//! - **Identifiers**: `LearnerId`, `CourseId`, `LessonId`, `QuizId`, `CertificateId`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::{HashParseError, IdError};

// =============================================================================
// HASHES
// =============================================================================

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// All-zero hash, used as the parent of the first link in every hash chain.
pub const ZERO_HASH: Hash = [0u8; 32];

/// SHA-256 over a sequence of byte slices, fed in order.
pub fn sha256_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Lowercase hex encoding of a hash.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64-character hex string (optionally `0x` prefixed) into a hash.
pub fn hash_from_hex(input: &str) -> Result<Hash, HashParseError> {
    let trimmed = input.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if stripped.len() != 64 {
        return Err(HashParseError::InvalidLength {
            expected: 64,
            actual: stripped.len(),
        });
    }

    let bytes = hex::decode(stripped).map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
    let mut hash = ZERO_HASH;
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

/// Serde adapter storing a [`Hash`] as a lowercase hex string.
///
/// Use with `#[serde(with = "shared_types::hex_hash")]`.
pub mod hex_hash {
    use super::{hash_from_hex, hash_to_hex, Hash};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hash_to_hex(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        hash_from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Maximum length of any identifier.
pub const MAX_ID_LEN: usize = 128;

fn validate_id(kind: &'static str, raw: &str) -> Result<(), IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if raw.len() > MAX_ID_LEN {
        return Err(IdError::TooLong {
            kind,
            max: MAX_ID_LEN,
            actual: raw.len(),
        });
    }
    // '|' is the field separator of the certificate content hash.
    if let Some(c) = raw
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || *c == '|')
    {
        return Err(IdError::InvalidCharacter { kind, character: c });
    }
    Ok(())
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn parse(raw: impl Into<String>) -> Result<Self, IdError> {
                let raw = raw.into();
                validate_id($kind, &raw)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a learner account.
    LearnerId,
    "learner"
);
define_id!(
    /// Identifier of a course.
    CourseId,
    "course"
);
define_id!(
    /// Identifier of a lesson within a course.
    LessonId,
    "lesson"
);
define_id!(
    /// Identifier of a quiz within a course.
    QuizId,
    "quiz"
);
define_id!(
    /// Public certificate identifier, e.g. `CERT-20261016-9F2A11C3`.
    CertificateId,
    "certificate"
);
