use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::domain::{AccessType, QuestionScope};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6 to 128 characters"))]
    pub password: String,

    /// Anything other than "teacher" or "admin" registers a student.
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub admin_secret: Option<String>,

    #[serde(default)]
    pub teacher_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_question_input"))]
pub struct QuestionInput {
    /// Present when editing an existing question, so attempts keep pointing at it.
    #[serde(default)]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 2000, message = "Question text is required"))]
    pub text: String,

    pub options: Vec<String>,

    pub correct_index: usize,
}

fn validate_question_input(question: &QuestionInput) -> Result<(), ValidationError> {
    validate_options(&question.options, question.correct_index)
}

/// Shared by quiz questions and bank questions.
pub fn validate_options(options: &[String], correct_index: usize) -> Result<(), ValidationError> {
    if options.len() < MIN_OPTIONS {
        return Err(ValidationError::new("options")
            .with_message("A question needs at least two options".into()));
    }
    if options.len() > MAX_OPTIONS {
        return Err(ValidationError::new("options")
            .with_message("A question can have at most six options".into()));
    }
    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(ValidationError::new("options").with_message("Options cannot be blank".into()));
    }
    if correct_index >= options.len() {
        return Err(ValidationError::new("correct_index")
            .with_message("Correct answer must reference one of the options".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 1, max = 600, message = "Time limit must be 1 to 600 minutes"))]
    pub time_limit_minutes: u32,

    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub marks_per_question: Option<u32>,

    #[validate(nested)]
    pub questions: Vec<QuestionInput>,

    #[serde(default)]
    pub is_enabled: Option<bool>,

    #[serde(default)]
    pub single_attempt: Option<bool>,

    #[serde(default)]
    pub access_type: Option<AccessType>,

    #[serde(default)]
    #[validate(length(min = 4, max = 32, message = "Access code must be 4 to 32 characters"))]
    pub access_code: Option<String>,

    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddFromBankRequest {
    #[validate(length(min = 1, message = "Select at least one question"))]
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_bank_question"))]
pub struct BankQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Question text is required"))]
    pub text: String,

    pub options: Vec<String>,

    pub correct_index: usize,

    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,

    #[serde(default)]
    pub scope: Option<QuestionScope>,
}

fn validate_bank_question(question: &BankQuestionRequest) -> Result<(), ValidationError> {
    validate_options(&question.options, question.correct_index)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: String,
    pub selected_index: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,

    #[serde(default)]
    pub time_taken_seconds: Option<i64>,

    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemCodeRequest {
    #[validate(length(min = 1, message = "Access code required"))]
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Group name required"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinGroupRequest {
    #[validate(length(min = 1, message = "Join code required"))]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeQuery {
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessCodeQuery {
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionListQuery {
    pub scope: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptListQuery {
    pub quiz_id: Option<String>,
}
