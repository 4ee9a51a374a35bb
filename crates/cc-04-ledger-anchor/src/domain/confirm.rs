//! Comparison of a certificate's hash with its ledger record.

use serde::{Deserialize, Serialize};
use shared_types::Hash;
use tracing::warn;

use crate::ports::LedgerAnchor;

/// Ledger view of a certificate at verification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorCheck {
    NotAnchored,
    Confirmed,
    Mismatch,
    Unavailable,
}

impl AnchorCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAnchored => "not_anchored",
            Self::Confirmed => "confirmed",
            Self::Mismatch => "mismatch",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Look up `certificate_id` and compare the stored hash with `expected`.
///
/// Ledger errors never propagate; they become `Unavailable`.
pub async fn confirm<A>(anchor: &A, certificate_id: &str, expected: &Hash) -> AnchorCheck
where
    A: LedgerAnchor + ?Sized,
{
    match anchor.lookup(certificate_id).await {
        Ok(Some(record)) if &record.content_hash == expected => AnchorCheck::Confirmed,
        Ok(Some(_)) => AnchorCheck::Mismatch,
        Ok(None) => AnchorCheck::NotAnchored,
        Err(e) => {
            warn!(certificate_id, network = anchor.network(), error = %e, "Ledger lookup failed");
            AnchorCheck::Unavailable
        }
    }
}
