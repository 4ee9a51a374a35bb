//! # Content Hash Integrity
//!
//! The content hash is SHA-256 over the immutable fields joined with `|`:
//!
//! ```text
//! certificate_id|learner_id|learner_name|course_id|course_title|final_score|grade|completed_at|issued_at|issuer
//! ```
//!
//! Scores use two decimals, grades their lowercase name, timestamps Unix
//! seconds. `\` and `|` inside text fields are backslash-escaped so a name
//! cannot shift the field boundaries.

use sha2::{Digest, Sha256};
use shared_types::{hash_from_hex, Hash};
use subtle::ConstantTimeEq;

use super::entities::{Certificate, CertificatePatch};
use super::errors::RegistryError;
use super::value_objects::{
    MAX_LEARNER_NAME_LEN, MAX_METADATA_ENTRIES, MAX_METADATA_KEY_LEN, MAX_METADATA_VALUE_LEN,
};

/// Fields covered by the content hash, in hashing order.
pub const IMMUTABLE_FIELDS: [&str; 10] = [
    "certificate_id",
    "learner_id",
    "learner_name",
    "course_id",
    "course_title",
    "final_score",
    "grade",
    "completed_at",
    "issued_at",
    "issuer",
];

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        if c == '\\' || c == '|' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn format_score(score: f64) -> String {
    format!("{score:.2}")
}

/// The exact string that is hashed.
pub fn canonical_content(certificate: &Certificate) -> String {
    [
        escape(certificate.certificate_id.as_str()),
        escape(certificate.learner_id.as_str()),
        escape(&certificate.learner_name),
        escape(certificate.course_id.as_str()),
        escape(&certificate.course_title),
        format_score(certificate.final_score),
        certificate.grade.as_str().to_string(),
        certificate.completed_at.to_string(),
        certificate.issued_at.to_string(),
        escape(&certificate.issuer),
    ]
    .join("|")
}

pub fn content_hash(certificate: &Certificate) -> Hash {
    Sha256::digest(canonical_content(certificate).as_bytes()).into()
}

/// Whether the stored hash still matches the immutable fields.
pub fn verify_integrity(certificate: &Certificate) -> bool {
    let expected = content_hash(certificate);
    expected.ct_eq(&certificate.content_hash).into()
}

/// Apply the mutable parts of `patch`.
///
/// Every immutable field present in the patch must equal the stored value;
/// otherwise nothing is applied. Returns whether anything changed.
pub fn apply_patch(
    certificate: &mut Certificate,
    patch: &CertificatePatch,
) -> Result<bool, RegistryError> {
    check_immutable(certificate, patch)?;

    let mut changed = false;

    if let Some(name) = &patch.display_name_override {
        let name = name.trim();
        let next = if name.is_empty() {
            None
        } else {
            if name.chars().count() > MAX_LEARNER_NAME_LEN {
                return Err(RegistryError::InvalidRequest(format!(
                    "display name exceeds {MAX_LEARNER_NAME_LEN} characters"
                )));
            }
            Some(name.to_string())
        };
        if certificate.display_name_override != next {
            certificate.display_name_override = next;
            changed = true;
        }
    }

    if let Some(metadata) = &patch.metadata {
        validate_metadata(metadata)?;
        if &certificate.metadata != metadata {
            certificate.metadata = metadata.clone();
            changed = true;
        }
    }

    Ok(changed)
}

fn differs<T: PartialEq>(requested: &Option<T>, current: &T) -> bool {
    requested.as_ref().is_some_and(|r| r != current)
}

/// Whether `patch` asks to change the hashed field named `field`.
fn hashed_field_differs(field: &str, certificate: &Certificate, patch: &CertificatePatch) -> bool {
    match field {
        "certificate_id" => differs(&patch.certificate_id, &certificate.certificate_id),
        "learner_id" => differs(&patch.learner_id, &certificate.learner_id),
        "learner_name" => differs(&patch.learner_name, &certificate.learner_name),
        "course_id" => differs(&patch.course_id, &certificate.course_id),
        "course_title" => differs(&patch.course_title, &certificate.course_title),
        "final_score" => patch
            .final_score
            .is_some_and(|s| format_score(s) != format_score(certificate.final_score)),
        "grade" => differs(&patch.grade, &certificate.grade),
        "completed_at" => differs(&patch.completed_at, &certificate.completed_at),
        "issued_at" => differs(&patch.issued_at, &certificate.issued_at),
        "issuer" => differs(&patch.issuer, &certificate.issuer),
        _ => false,
    }
}

fn check_immutable(certificate: &Certificate, patch: &CertificatePatch) -> Result<(), RegistryError> {
    if let Some(field) = IMMUTABLE_FIELDS
        .into_iter()
        .find(|field| hashed_field_differs(field, certificate, patch))
    {
        return Err(RegistryError::ImmutableField { field });
    }

    if let Some(hex) = &patch.content_hash {
        let requested = hash_from_hex(hex)
            .map_err(|e| RegistryError::InvalidRequest(format!("content_hash: {e}")))?;
        if requested != certificate.content_hash {
            return Err(RegistryError::ImmutableField {
                field: "content_hash",
            });
        }
    }
    if differs(&patch.status, &certificate.status) {
        return Err(RegistryError::ImmutableField { field: "status" });
    }
    if patch
        .expires_at
        .is_some_and(|at| certificate.expires_at != Some(at))
    {
        return Err(RegistryError::ImmutableField {
            field: "expires_at",
        });
    }
    Ok(())
}

fn validate_metadata(
    metadata: &std::collections::BTreeMap<String, String>,
) -> Result<(), RegistryError> {
    if metadata.len() > MAX_METADATA_ENTRIES {
        return Err(RegistryError::InvalidRequest(format!(
            "at most {MAX_METADATA_ENTRIES} metadata entries"
        )));
    }
    for (key, value) in metadata {
        if key.trim().is_empty() || key.chars().count() > MAX_METADATA_KEY_LEN {
            return Err(RegistryError::InvalidRequest(format!(
                "metadata key must be 1..={MAX_METADATA_KEY_LEN} characters"
            )));
        }
        if value.chars().count() > MAX_METADATA_VALUE_LEN {
            return Err(RegistryError::InvalidRequest(format!(
                "metadata value for '{key}' exceeds {MAX_METADATA_VALUE_LEN} characters"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CertificateStatus;
    use cc_01_eligibility::Grade;
    use shared_types::{CertificateId, CourseId, LearnerId, ZERO_HASH};
    use std::collections::BTreeMap;

    fn certificate() -> Certificate {
        let mut c = Certificate {
            certificate_id: CertificateId::parse("CERT-20240315-0A1B2C3D").unwrap(),
            learner_id: LearnerId::parse("learner-42").unwrap(),
            learner_name: "Ada Lovelace".into(),
            course_id: CourseId::parse("rust-101").unwrap(),
            course_title: "Rust Basics".into(),
            final_score: 91.5,
            grade: Grade::Distinction,
            completed_at: 1_710_000_000,
            issued_at: 1_710_504_000,
            issuer: "CertChain Academy".into(),
            content_hash: ZERO_HASH,
            status: CertificateStatus::Active,
            revocation: None,
            anchor: None,
            verification_count: 0,
            last_verified_at: None,
            display_name_override: None,
            metadata: BTreeMap::new(),
            expires_at: None,
        };
        c.content_hash = content_hash(&c);
        c
    }

    #[test]
    fn test_canonical_content_layout() {
        assert_eq!(
            canonical_content(&certificate()),
            "CERT-20240315-0A1B2C3D|learner-42|Ada Lovelace|rust-101|Rust Basics|91.50|distinction|1710000000|1710504000|CertChain Academy"
        );
    }

    #[test]
    fn test_integrity_holds_and_breaks() {
        let mut c = certificate();
        assert!(verify_integrity(&c));
        c.final_score = 99.0;
        assert!(!verify_integrity(&c));
    }

    #[test]
    fn test_mutable_fields_outside_hash() {
        let mut c = certificate();
        c.verification_count = 10;
        c.metadata.insert("cohort".into(), "2024".into());
        c.display_name_override = Some("Countess of Lovelace".into());
        assert!(verify_integrity(&c));
    }

    #[test]
    fn test_separator_in_name_cannot_shift_fields() {
        let mut a = certificate();
        a.learner_name = "Ada|rust-101".into();
        a.course_title = "Basics".into();
        let mut b = certificate();
        b.learner_name = "Ada".into();
        b.course_title = "rust-101|Basics".into();
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_patch_rejects_immutable_change() {
        let mut c = certificate();
        let before = c.clone();
        let patch = CertificatePatch {
            final_score: Some(100.0),
            display_name_override: Some("New Name".into()),
            ..Default::default()
        };
        match apply_patch(&mut c, &patch) {
            Err(RegistryError::ImmutableField { field }) => assert_eq!(field, "final_score"),
            other => panic!("expected immutable field error, got {other:?}"),
        }
        assert_eq!(c, before);
    }

    #[test]
    fn test_every_hashed_field_is_immutable() {
        assert_eq!(
            canonical_content(&certificate()).split('|').count(),
            IMMUTABLE_FIELDS.len()
        );

        for field in IMMUTABLE_FIELDS {
            let mut patch = CertificatePatch::default();
            match field {
                "certificate_id" => {
                    patch.certificate_id = Some(CertificateId::parse("CERT-20240315-FFFFFFFF").unwrap())
                }
                "learner_id" => patch.learner_id = Some(LearnerId::parse("learner-7").unwrap()),
                "learner_name" => patch.learner_name = Some("Grace Hopper".into()),
                "course_id" => patch.course_id = Some(CourseId::parse("go-101").unwrap()),
                "course_title" => patch.course_title = Some("Go Basics".into()),
                "final_score" => patch.final_score = Some(50.0),
                "grade" => patch.grade = Some(Grade::Pass),
                "completed_at" => patch.completed_at = Some(1),
                "issued_at" => patch.issued_at = Some(2),
                "issuer" => patch.issuer = Some("Elsewhere".into()),
                other => panic!("no patch for hashed field {other}"),
            }

            let mut c = certificate();
            match apply_patch(&mut c, &patch) {
                Err(RegistryError::ImmutableField { field: rejected }) => assert_eq!(rejected, field),
                other => panic!("{field}: expected immutable field error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_patch_same_value_is_noop() {
        let mut c = certificate();
        let patch = CertificatePatch {
            learner_name: Some("Ada Lovelace".into()),
            final_score: Some(91.5),
            status: Some(CertificateStatus::Active),
            ..Default::default()
        };
        assert!(!apply_patch(&mut c, &patch).unwrap());
    }

    #[test]
    fn test_patch_applies_mutable_fields() {
        let mut c = certificate();
        let mut metadata = BTreeMap::new();
        metadata.insert("cohort".to_string(), "spring".to_string());
        let patch = CertificatePatch {
            display_name_override: Some("  A. Lovelace ".into()),
            metadata: Some(metadata.clone()),
            ..Default::default()
        };
        assert!(apply_patch(&mut c, &patch).unwrap());
        assert_eq!(c.display_name(), "A. Lovelace");
        assert_eq!(c.metadata, metadata);
        assert!(verify_integrity(&c));

        let clear = CertificatePatch {
            display_name_override: Some(String::new()),
            ..Default::default()
        };
        assert!(apply_patch(&mut c, &clear).unwrap());
        assert_eq!(c.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_patch_status_rejected() {
        let mut c = certificate();
        let patch = CertificatePatch {
            status: Some(CertificateStatus::Revoked),
            ..Default::default()
        };
        assert!(matches!(
            apply_patch(&mut c, &patch),
            Err(RegistryError::ImmutableField { field: "status" })
        ));
    }

    #[test]
    fn test_patch_metadata_limits() {
        let mut c = certificate();
        let metadata: BTreeMap<String, String> = (0..=MAX_METADATA_ENTRIES)
            .map(|i| (format!("k{i}"), "v".to_string()))
            .collect();
        let patch = CertificatePatch {
            metadata: Some(metadata),
            ..Default::default()
        };
        assert!(matches!(
            apply_patch(&mut c, &patch),
            Err(RegistryError::InvalidRequest(_))
        ));
    }
}
