//! # Domain Errors
//!
//! Errors that prevent an evaluation from running at all. A learner who
//! simply has not finished the course is not an error; that is reported as
//! gaps in the `EligibilityReport`.

use shared_types::{CourseId, QuizId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    /// Progress record belongs to a different course.
    #[error("progress is for course {progress}, outline is for {outline}")]
    CourseMismatch { outline: CourseId, progress: CourseId },

    /// Outline has neither lessons nor quizzes.
    #[error("course {0} has no lessons or quizzes")]
    EmptyCourse(CourseId),

    /// Quiz requirement with a passing score above 100%.
    #[error("quiz {quiz_id} passing score {percent}% exceeds 100%")]
    InvalidRequirement { quiz_id: QuizId, percent: u8 },

    /// Attempt with a zero maximum or a score above the maximum.
    #[error("invalid attempt for quiz {quiz_id}: score {score} of {max_score}")]
    InvalidAttempt {
        quiz_id: QuizId,
        score: u32,
        max_score: u32,
    },

    /// Policy weights or thresholds are unusable.
    #[error("invalid eligibility policy: {0}")]
    InvalidPolicy(String),
}
