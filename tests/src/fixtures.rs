//! Shared test fixtures: a two-lesson course, progress records and a fully
//! wired node on a manual clock.

use std::sync::Arc;

use cc_01_eligibility::{
    CourseOutline, LearnerProgress, LessonCompletion, QuizAttempt, QuizRequirement,
};
use cc_02_certificate_registry::IssueRequest;
use node_runtime::{NodeConfig, NodeContainer};
use shared_types::{CourseId, LearnerId, LessonId, ManualTimeSource, QuizId, RequestContext};

/// 2024-03-15T12:00:00Z
pub const START: u64 = 1_710_504_000;
pub const DAY: u64 = 86_400;
pub const API_KEY: &str = "integration-key-0123456789abcdef";
pub const COURSE: &str = "rust-101";

pub fn outline() -> CourseOutline {
    CourseOutline {
        course_id: CourseId::parse(COURSE).unwrap(),
        title: "Rust Fundamentals".into(),
        lessons: vec![
            LessonId::parse("ownership").unwrap(),
            LessonId::parse("traits").unwrap(),
        ],
        quizzes: vec![QuizRequirement {
            quiz_id: QuizId::parse("final-exam").unwrap(),
            passing_score_percent: 70,
        }],
    }
}

/// Both lessons done and one exam attempt scoring `score` out of 100.
pub fn progress(learner: &str, score: u32) -> LearnerProgress {
    LearnerProgress {
        learner_id: LearnerId::parse(learner).unwrap(),
        course_id: CourseId::parse(COURSE).unwrap(),
        completed_lessons: vec![
            LessonCompletion {
                lesson_id: LessonId::parse("ownership").unwrap(),
                completed_at: START - 3 * DAY,
            },
            LessonCompletion {
                lesson_id: LessonId::parse("traits").unwrap(),
                completed_at: START - 2 * DAY,
            },
        ],
        quiz_attempts: vec![QuizAttempt {
            quiz_id: QuizId::parse("final-exam").unwrap(),
            score,
            max_score: 100,
            submitted_at: START - DAY,
        }],
    }
}

pub fn issue_request(learner: &str, score: u32) -> IssueRequest {
    IssueRequest {
        learner_name: "Ada Lovelace".into(),
        outline: outline(),
        progress: progress(learner, score),
    }
}

/// Default node config with an issuer key.
pub fn node_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.gateway.auth.api_key = Some(API_KEY.to_string());
    config
}

pub fn node(config: NodeConfig, clock: &ManualTimeSource) -> NodeContainer {
    NodeContainer::with_clock(config, Arc::new(clock.clone())).unwrap()
}

pub fn ctx(ip: &str) -> RequestContext {
    RequestContext::new(Some(ip.parse().unwrap())).with_user_agent("integration/1.0")
}
