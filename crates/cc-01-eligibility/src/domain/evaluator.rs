//! # Eligibility Evaluator
//!
//! ALGORITHM: one pass over completions and attempts, keyed by the outline.
//!
//! 1. Validate inputs (course match, non-empty outline, sane attempts)
//! 2. Lesson %: distinct outline lessons completed / total lessons
//! 3. Quiz %: best attempt per quiz, averaged over all required quizzes
//! 4. Final score: weighted sum, rounded to two decimals
//! 5. Gaps: missing lessons, unattempted/unpassed quizzes, low score

use std::collections::{HashMap, HashSet};

use shared_types::{LessonId, QuizId, Timestamp};

use super::entities::{
    CourseOutline, EligibilityGap, EligibilityReport, LearnerProgress, QuizAttempt,
};
use super::errors::EligibilityError;
use super::value_objects::EligibilityPolicy;

/// Evaluate a learner's progress against a course outline.
pub fn evaluate(
    outline: &CourseOutline,
    progress: &LearnerProgress,
    policy: &EligibilityPolicy,
) -> Result<EligibilityReport, EligibilityError> {
    validate_inputs(outline, progress, policy)?;

    let mut gaps = Vec::new();
    let mut latest: Option<Timestamp> = None;

    // Lessons
    let outline_lessons: HashSet<&LessonId> = outline.lessons.iter().collect();
    let mut completed: HashMap<&LessonId, Timestamp> = HashMap::new();
    for completion in &progress.completed_lessons {
        if !outline_lessons.contains(&completion.lesson_id) {
            continue;
        }
        completed
            .entry(&completion.lesson_id)
            .and_modify(|t| *t = (*t).min(completion.completed_at))
            .or_insert(completion.completed_at);
    }
    for at in completed.values() {
        latest = Some(latest.map_or(*at, |l| l.max(*at)));
    }

    let lessons_total = outline_lessons.len();
    let lessons_completed = completed.len();
    let lesson_completion_percent = if lessons_total == 0 {
        100.0
    } else {
        lessons_completed as f64 * 100.0 / lessons_total as f64
    };

    if policy.require_all_lessons {
        // Outline order keeps the gap list stable.
        let mut seen = HashSet::new();
        for lesson_id in &outline.lessons {
            if seen.insert(lesson_id) && !completed.contains_key(lesson_id) {
                gaps.push(EligibilityGap::LessonIncomplete {
                    lesson_id: lesson_id.clone(),
                });
            }
        }
    }

    // Quizzes
    let best = best_attempts(&progress.quiz_attempts);
    let mut quizzes_passed = 0;
    let mut quiz_percent_sum = 0.0;
    for requirement in &outline.quizzes {
        match best.get(&requirement.quiz_id) {
            Some(attempt) => {
                let percent = attempt.percent();
                quiz_percent_sum += percent;
                if percent >= f64::from(requirement.passing_score_percent) {
                    quizzes_passed += 1;
                    latest = Some(latest.map_or(attempt.submitted_at, |l| {
                        l.max(attempt.submitted_at)
                    }));
                } else if policy.require_all_quizzes {
                    gaps.push(EligibilityGap::QuizNotPassed {
                        quiz_id: requirement.quiz_id.clone(),
                        best_percent: round2(percent),
                        required_percent: requirement.passing_score_percent,
                    });
                }
            }
            None => {
                if policy.require_all_quizzes {
                    gaps.push(EligibilityGap::QuizNotAttempted {
                        quiz_id: requirement.quiz_id.clone(),
                    });
                }
            }
        }
    }

    let quizzes_total = outline.quizzes.len();
    let average_quiz_percent = if quizzes_total == 0 {
        100.0
    } else {
        quiz_percent_sum / quizzes_total as f64
    };

    let weight_sum = policy.lesson_weight + policy.quiz_weight;
    let final_score = round2(
        (policy.lesson_weight * lesson_completion_percent
            + policy.quiz_weight * average_quiz_percent)
            / weight_sum,
    );

    if final_score < policy.minimum_final_score {
        gaps.push(EligibilityGap::ScoreBelowMinimum {
            final_score,
            minimum: policy.minimum_final_score,
        });
    }

    let eligible = gaps.is_empty();
    tracing::debug!(
        learner_id = %progress.learner_id,
        course_id = %outline.course_id,
        final_score,
        eligible,
        gaps = gaps.len(),
        "eligibility evaluated"
    );

    Ok(EligibilityReport {
        learner_id: progress.learner_id.clone(),
        course_id: outline.course_id.clone(),
        eligible,
        lessons_completed,
        lessons_total,
        quizzes_passed,
        quizzes_total,
        lesson_completion_percent: round2(lesson_completion_percent),
        average_quiz_percent: round2(average_quiz_percent),
        final_score,
        grade: policy.grade_for(final_score),
        completed_at: latest,
        gaps,
    })
}

fn validate_inputs(
    outline: &CourseOutline,
    progress: &LearnerProgress,
    policy: &EligibilityPolicy,
) -> Result<(), EligibilityError> {
    policy.validate()?;

    if outline.course_id != progress.course_id {
        return Err(EligibilityError::CourseMismatch {
            outline: outline.course_id.clone(),
            progress: progress.course_id.clone(),
        });
    }
    if outline.is_empty() {
        return Err(EligibilityError::EmptyCourse(outline.course_id.clone()));
    }
    if let Some(req) = outline
        .quizzes
        .iter()
        .find(|q| q.passing_score_percent > 100)
    {
        return Err(EligibilityError::InvalidRequirement {
            quiz_id: req.quiz_id.clone(),
            percent: req.passing_score_percent,
        });
    }
    if let Some(bad) = progress
        .quiz_attempts
        .iter()
        .find(|a| a.max_score == 0 || a.score > a.max_score)
    {
        return Err(EligibilityError::InvalidAttempt {
            quiz_id: bad.quiz_id.clone(),
            score: bad.score,
            max_score: bad.max_score,
        });
    }
    Ok(())
}

/// Highest-percentage attempt per quiz; ties go to the earliest submission.
fn best_attempts(attempts: &[QuizAttempt]) -> HashMap<&QuizId, &QuizAttempt> {
    let mut best: HashMap<&QuizId, &QuizAttempt> = HashMap::new();
    for attempt in attempts {
        best.entry(&attempt.quiz_id)
            .and_modify(|current| {
                let (p_new, p_cur) = (attempt.percent(), current.percent());
                if p_new > p_cur || (p_new == p_cur && attempt.submitted_at < current.submitted_at)
                {
                    *current = attempt;
                }
            })
            .or_insert(attempt);
    }
    best
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
