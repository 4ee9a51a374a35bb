//! # Eligibility Service
//!
//! Holds a validated [`EligibilityPolicy`] and applies it on every call.

use crate::domain::{
    evaluate, CourseOutline, EligibilityError, EligibilityPolicy, EligibilityReport,
    LearnerProgress,
};
use crate::ports::EligibilityApi;

#[derive(Debug, Clone, Default)]
pub struct EligibilityService {
    policy: EligibilityPolicy,
}

impl EligibilityService {
    /// Create a service, rejecting an unusable policy up front.
    pub fn new(policy: EligibilityPolicy) -> Result<Self, EligibilityError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }
}

impl EligibilityApi for EligibilityService {
    fn evaluate(
        &self,
        outline: &CourseOutline,
        progress: &LearnerProgress,
    ) -> Result<EligibilityReport, EligibilityError> {
        evaluate(outline, progress, &self.policy)
    }
}
