//! # Eligibility Subsystem (cc-01)
//!
//! Decides whether a learner qualifies for a course certificate by walking
//! their lesson completions and quiz attempts against the course outline.
//!
//! ## Rules
//!
//! | Rule | Behaviour |
//! |------|-----------|
//! | Lessons | Distinct completed lessons of the outline / total lessons |
//! | Quizzes | Best attempt per quiz counts; passed if ≥ quiz passing score |
//! | Score | Weighted sum of lesson completion % and average quiz % |
//! | Gate | Eligible only when no gaps remain (lessons, quizzes, minimum score) |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): Pure evaluation logic, no I/O
//! - **Ports Layer** (`ports/`): Inbound `EligibilityApi`
//! - **Service** (`service.rs`): Policy-holding implementation of the API

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    evaluate, CourseOutline, EligibilityError, EligibilityGap, EligibilityPolicy,
    EligibilityReport, Grade, LearnerProgress, LessonCompletion, QuizAttempt, QuizRequirement,
};
pub use ports::EligibilityApi;
pub use service::EligibilityService;
