//! # Outbound Ports (Driven Ports)

use crate::domain::{LogError, VerificationEntry};

/// Durable destination for sealed audit entries.
///
/// Production: `JsonLinesSink`
/// Testing: `NullSink`
pub trait AuditSink: Send + Sync {
    /// Persist one entry. The entry becomes visible only if this succeeds,
    /// and on error nothing of it may remain in storage.
    fn append(&self, entry: &VerificationEntry) -> Result<(), LogError>;

    /// Feed every persisted entry to `visit`, oldest first. Stops at the
    /// first error `visit` returns.
    fn replay(
        &self,
        visit: &mut dyn FnMut(VerificationEntry) -> Result<(), LogError>,
    ) -> Result<(), LogError>;
}
