//! # Value Objects
//!
//! Evaluation policy and grade bands.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::EligibilityError;

/// Final score at or above which a certificate is graded `Distinction`.
pub const DISTINCTION_THRESHOLD: f64 = 90.0;

/// Final score at or above which a certificate is graded `Merit`.
pub const MERIT_THRESHOLD: f64 = 75.0;

/// Weights and gates applied by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityPolicy {
    /// Weight of the lesson completion percentage.
    pub lesson_weight: f64,
    /// Weight of the average quiz percentage.
    pub quiz_weight: f64,
    /// Minimum weighted final score to qualify.
    pub minimum_final_score: f64,
    /// Every lesson must be completed.
    pub require_all_lessons: bool,
    /// Every quiz must be passed.
    pub require_all_quizzes: bool,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            lesson_weight: 0.3,
            quiz_weight: 0.7,
            minimum_final_score: 60.0,
            require_all_lessons: true,
            require_all_quizzes: true,
        }
    }
}

impl EligibilityPolicy {
    pub fn validate(&self) -> Result<(), EligibilityError> {
        let weights_finite = self.lesson_weight.is_finite() && self.quiz_weight.is_finite();
        if !weights_finite || self.lesson_weight < 0.0 || self.quiz_weight < 0.0 {
            return Err(EligibilityError::InvalidPolicy(
                "weights must be finite and non-negative".into(),
            ));
        }
        if self.lesson_weight + self.quiz_weight <= 0.0 {
            return Err(EligibilityError::InvalidPolicy(
                "weights must not sum to zero".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.minimum_final_score) {
            return Err(EligibilityError::InvalidPolicy(
                "minimum_final_score must be within 0..=100".into(),
            ));
        }
        Ok(())
    }

    /// Grade band for a final score.
    pub fn grade_for(&self, final_score: f64) -> Grade {
        if final_score < self.minimum_final_score {
            Grade::Fail
        } else if final_score >= DISTINCTION_THRESHOLD {
            Grade::Distinction
        } else if final_score >= MERIT_THRESHOLD {
            Grade::Merit
        } else {
            Grade::Pass
        }
    }
}

/// Grade printed on a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Distinction,
    Merit,
    Pass,
    Fail,
}

impl Grade {
    /// Stable lowercase name, used in content hashes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Distinction => "distinction",
            Grade::Merit => "merit",
            Grade::Pass => "pass",
            Grade::Fail => "fail",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
