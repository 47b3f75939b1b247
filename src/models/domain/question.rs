use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz::QuizQuestion;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionScope {
    #[default]
    Personal,
    Global,
}

/// A reusable question in the bank, independent of any quiz.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub category: String,
    pub scope: QuestionScope,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(
        text: &str,
        options: Vec<String>,
        correct_index: usize,
        category: &str,
        scope: QuestionScope,
        created_by: &str,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            text: text.trim().to_string(),
            options,
            correct_index,
            category: category.trim().to_string(),
            scope,
            created_by: created_by.to_string(),
            created_at: Some(Utc::now()),
        }
    }

    /// Copies the question into a quiz under a fresh id. Later bank edits do not follow.
    pub fn to_quiz_question(&self) -> QuizQuestion {
        QuizQuestion::new(&self.text, self.options.clone(), self.correct_index)
    }
}
