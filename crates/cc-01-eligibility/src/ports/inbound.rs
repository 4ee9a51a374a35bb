//! # Inbound Ports (Driving Ports)
//!
//! Public API exposed by the Eligibility subsystem.

use crate::domain::{CourseOutline, EligibilityError, EligibilityReport, LearnerProgress};

/// Primary API for the Eligibility subsystem.
///
/// Implemented by [`crate::EligibilityService`]; the registry and the
/// gateway's dry-run endpoint consume it.
pub trait EligibilityApi: Send + Sync {
    /// Evaluate a learner against a course outline.
    ///
    /// ## Returns
    ///
    /// - `Ok(report)`: evaluation ran; `report.eligible` holds the verdict
    /// - `Err(_)`: inputs were inconsistent (wrong course, empty outline, bad attempt)
    fn evaluate(
        &self,
        outline: &CourseOutline,
        progress: &LearnerProgress,
    ) -> Result<EligibilityReport, EligibilityError>;
}
