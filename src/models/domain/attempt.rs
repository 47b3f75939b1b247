use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    pub selected_index: i64,
}

/// One student's completed submission for one quiz. Never updated after insert.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    /// Copied from the quiz so the unique partial index can filter on it.
    pub single_attempt: bool,
    pub answers: Vec<AttemptAnswer>,
    pub score: u32,
    pub time_taken_seconds: u32,
    pub attempt_date: DateTime<Utc>,
}

impl Attempt {
    pub fn new(
        user_id: &str,
        quiz_id: &str,
        single_attempt: bool,
        answers: Vec<AttemptAnswer>,
        score: u32,
        time_taken_seconds: u32,
    ) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            single_attempt,
            answers,
            score,
            time_taken_seconds,
            attempt_date: Utc::now(),
        }
    }
}
