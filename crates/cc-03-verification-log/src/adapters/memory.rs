use crate::domain::{LogError, VerificationEntry};
use crate::ports::AuditSink;

/// Sink that persists nothing. Entries live only in the log's window.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn append(&self, _entry: &VerificationEntry) -> Result<(), LogError> {
        Ok(())
    }

    fn replay(
        &self,
        _visit: &mut dyn FnMut(VerificationEntry) -> Result<(), LogError>,
    ) -> Result<(), LogError> {
        Ok(())
    }
}
