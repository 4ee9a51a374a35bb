//! Registry configuration.

use cc_01_eligibility::EligibilityPolicy;
use serde::{Deserialize, Serialize};

use super::errors::RegistryError;

/// Longest accepted learner name, in characters.
pub const MAX_LEARNER_NAME_LEN: usize = 200;

/// Longest accepted revocation reason, in characters.
pub const MAX_REASON_LEN: usize = 1_000;

/// Most metadata entries a certificate may carry.
pub const MAX_METADATA_ENTRIES: usize = 32;

/// Longest metadata key, in characters.
pub const MAX_METADATA_KEY_LEN: usize = 64;

/// Longest metadata value, in characters.
pub const MAX_METADATA_VALUE_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Organisation name written into every certificate.
    pub issuer: String,
    /// Certificates expire this many days after issuance. `None` never expires.
    pub validity_days: Option<u32>,
    /// Anchor the content hash right after issuance when a ledger is configured.
    pub anchor_on_issue: bool,
    pub eligibility: EligibilityPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            issuer: "CertChain Academy".to_string(),
            validity_days: None,
            anchor_on_issue: true,
            eligibility: EligibilityPolicy::default(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), RegistryError> {
        let issuer = self.issuer.trim();
        if issuer.is_empty() {
            return Err(RegistryError::InvalidRequest("issuer must not be empty".into()));
        }
        if issuer.chars().count() > MAX_LEARNER_NAME_LEN {
            return Err(RegistryError::InvalidRequest("issuer name too long".into()));
        }
        if self.validity_days == Some(0) {
            return Err(RegistryError::InvalidRequest(
                "validity_days must be positive".into(),
            ));
        }
        self.eligibility.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RegistryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_validity_rejected() {
        let config = RegistryConfig {
            validity_days: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
