//! # Domain Entities
//!
//! Course outlines, learner progress records and the evaluation report.

use serde::{Deserialize, Serialize};
use shared_types::{CourseId, LearnerId, LessonId, QuizId, Timestamp};

use super::value_objects::Grade;

/// The requirements a learner must satisfy for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonId>,
    #[serde(default)]
    pub quizzes: Vec<QuizRequirement>,
}

impl CourseOutline {
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty() && self.quizzes.is_empty()
    }
}

/// A graded quiz and the percentage needed to pass it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequirement {
    pub quiz_id: QuizId,
    /// Passing threshold, 0..=100.
    pub passing_score_percent: u8,
}

/// Everything a learner has done in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProgress {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    #[serde(default)]
    pub completed_lessons: Vec<LessonCompletion>,
    #[serde(default)]
    pub quiz_attempts: Vec<QuizAttempt>,
}

/// A lesson marked complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCompletion {
    pub lesson_id: LessonId,
    pub completed_at: Timestamp,
}

/// One submitted quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub quiz_id: QuizId,
    pub score: u32,
    pub max_score: u32,
    pub submitted_at: Timestamp,
}

impl QuizAttempt {
    /// Score as a percentage of `max_score`. Callers validate `max_score > 0`.
    pub fn percent(&self) -> f64 {
        f64::from(self.score) * 100.0 / f64::from(self.max_score)
    }
}

/// Why a learner is not (yet) eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EligibilityGap {
    LessonIncomplete {
        lesson_id: LessonId,
    },
    QuizNotAttempted {
        quiz_id: QuizId,
    },
    QuizNotPassed {
        quiz_id: QuizId,
        best_percent: f64,
        required_percent: u8,
    },
    ScoreBelowMinimum {
        final_score: f64,
        minimum: f64,
    },
}

/// Outcome of an eligibility evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub eligible: bool,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    pub quizzes_passed: usize,
    pub quizzes_total: usize,
    pub lesson_completion_percent: f64,
    pub average_quiz_percent: f64,
    /// Weighted final score, two decimals.
    pub final_score: f64,
    pub grade: Grade,
    /// Latest counted completion or passing attempt.
    pub completed_at: Option<Timestamp>,
    pub gaps: Vec<EligibilityGap>,
}
