use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    AccessType, Attempt, Group, Question, QuestionScope, Quiz, QuizQuestion, User, UserRole,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// The session as the client sees it.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDto {
    pub id: String,
    pub role: UserRole,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserDto,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub category: String,
    pub time_limit_minutes: u32,
    pub total_marks: u32,
    pub single_attempt: bool,
    pub access_type: AccessType,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        QuizSummary {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            category: quiz.category.clone(),
            time_limit_minutes: quiz.time_limit_minutes,
            total_marks: quiz.total_marks,
            single_attempt: quiz.single_attempt,
            access_type: quiz.access_type,
        }
    }
}

/// A question as served to a student: no answer key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionForTaking {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

impl From<QuizQuestion> for QuestionForTaking {
    fn from(question: QuizQuestion) -> Self {
        QuestionForTaking {
            id: question.id,
            text: question.text,
            options: question.options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizForTaking {
    pub id: String,
    pub title: String,
    pub category: String,
    pub time_limit_minutes: u32,
    pub total_marks: u32,
    pub single_attempt: bool,
    pub attempted: bool,
    pub questions: Vec<QuestionForTaking>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestionDto {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl From<QuizQuestion> for QuizQuestionDto {
    fn from(question: QuizQuestion) -> Self {
        QuizQuestionDto {
            id: question.id,
            text: question.text,
            options: question.options,
            correct_index: question.correct_index,
        }
    }
}

/// Full quiz for its owner or an admin, answer key and access code included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedQuizDto {
    pub id: String,
    pub title: String,
    pub category: String,
    pub time_limit_minutes: u32,
    pub total_marks: u32,
    pub marks_per_question: u32,
    pub is_enabled: bool,
    pub single_attempt: bool,
    pub access_type: AccessType,
    pub access_code: Option<String>,
    pub group_id: Option<String>,
    pub questions: Vec<QuizQuestionDto>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<Quiz> for ManagedQuizDto {
    fn from(quiz: Quiz) -> Self {
        ManagedQuizDto {
            id: quiz.id,
            title: quiz.title,
            category: quiz.category,
            time_limit_minutes: quiz.time_limit_minutes,
            total_marks: quiz.total_marks,
            marks_per_question: quiz.marks_per_question,
            is_enabled: quiz.is_enabled,
            single_attempt: quiz.single_attempt,
            access_type: quiz.access_type,
            access_code: quiz.access_code,
            group_id: quiz.group_id,
            questions: quiz.questions.into_iter().map(QuizQuestionDto::from).collect(),
            created_by: quiz.created_by,
            created_at: quiz.created_at,
            modified_at: quiz.modified_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub question_id: String,
    pub selected_index: i64,
    pub correct_index: Option<usize>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub attempt_id: String,
    pub score: u32,
    pub total_marks: u32,
    pub review: Vec<ReviewItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptReviewResponse {
    pub attempt_id: String,
    pub quiz: QuizSummary,
    pub score: u32,
    pub total_marks: u32,
    pub time_taken_seconds: u32,
    pub attempt_date: DateTime<Utc>,
    pub review: Vec<ReviewItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptHistoryItem {
    pub id: String,
    /// None when the quiz has since been deleted.
    pub quiz: Option<QuizSummary>,
    pub score: u32,
    pub time_taken_seconds: u32,
    pub attempt_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAttemptItem {
    pub id: String,
    pub user: Option<UserDto>,
    pub quiz: Option<QuizSummary>,
    pub score: u32,
    pub time_taken_seconds: u32,
    pub attempt_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub user_name: String,
    pub score: u32,
    pub time_taken_seconds: u32,
    pub attempt_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub users_count: u64,
    pub quiz_count: u64,
    pub attempts_count: u64,
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub id: String,
    pub name: String,
    pub code: String,
    pub owner: Option<UserDto>,
    pub members: Vec<UserDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GroupDto {
    /// `users` must contain the owner and members; ids without a user record are dropped.
    pub fn from_group(group: Group, users: &[User]) -> Self {
        let lookup = |id: &str| users.iter().find(|u| u.id == id).cloned().map(UserDto::from);

        GroupDto {
            owner: lookup(&group.created_by),
            members: group.members.iter().filter_map(|m| lookup(m)).collect(),
            id: group.id,
            name: group.name,
            code: group.code,
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankQuestionDto {
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

impl From<Question> for BankQuestionDto {
    fn from(question: Question) -> Self {
        BankQuestionDto {
            id: question.id,
            text: question.text,
            options: question.options,
            correct_index: question.correct_index,
            category: question.category,
            scope: question.scope,
            created_by: question.created_by,
            created_at: question.created_at,
        }
    }
}

impl AttemptHistoryItem {
    pub fn new(attempt: Attempt, quiz: Option<&Quiz>) -> Self {
        AttemptHistoryItem {
            id: attempt.id,
            quiz: quiz.map(QuizSummary::from),
            score: attempt.score,
            time_taken_seconds: attempt.time_taken_seconds,
            attempt_date: attempt.attempt_date,
        }
    }
}
