use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    #[default]
    Global,
    Group,
    Code,
}

/// A question embedded in a quiz. Bank questions are copied into this shape by value.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl QuizQuestion {
    pub fn new(text: &str, options: Vec<String>, correct_index: usize) -> Self {
        QuizQuestion {
            id: Uuid::new_v4().to_string(),
            text: text.trim().to_string(),
            options,
            correct_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub category: String,
    pub time_limit_minutes: u32,
    pub total_marks: u32,
    pub marks_per_question: u32,
    pub is_enabled: bool,
    pub single_attempt: bool,
    pub access_type: AccessType,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub access_code_hash: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    pub questions: Vec<QuizQuestion>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(
        title: &str,
        category: &str,
        time_limit_minutes: u32,
        marks_per_question: u32,
        questions: Vec<QuizQuestion>,
        created_by: &str,
    ) -> Self {
        let mut quiz = Quiz {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            category: category.trim().to_string(),
            time_limit_minutes,
            total_marks: 0,
            marks_per_question: marks_per_question.max(1),
            is_enabled: true,
            single_attempt: true,
            access_type: AccessType::Global,
            access_code: None,
            access_code_hash: None,
            group_id: None,
            questions,
            created_by: created_by.to_string(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };
        quiz.recompute_total_marks();
        quiz
    }

    /// Keeps `total_marks` equal to one mark per question, scaled by `marks_per_question`.
    pub fn recompute_total_marks(&mut self) {
        self.total_marks = self.questions.len() as u32 * self.marks_per_question;
    }

    pub fn find_question(&self, question_id: &str) -> Option<&QuizQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }
}
