//! Certificate id generation: `CERT-YYYYMMDD-XXXXXXXX`.

use chrono::{DateTime, Utc};
use shared_types::{CertificateId, IdError, Timestamp};
use uuid::Uuid;

pub const CERTIFICATE_ID_PREFIX: &str = "CERT";

/// New id for a certificate issued at `issued_at` (UTC date).
pub fn new_certificate_id(issued_at: Timestamp) -> Result<CertificateId, IdError> {
    let date = i64::try_from(issued_at)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default()
        .format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    CertificateId::parse(format!("{CERTIFICATE_ID_PREFIX}-{date}-{suffix}"))
}
