use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{require_owner_or_admin, require_staff, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::Question,
        dto::{
            request::{BankQuestionRequest, QuestionListQuery},
            response::BankQuestionDto,
        },
    },
    repositories::{QuestionFilter, QuestionRepository, QuestionVisibility},
};

/// The question bank: reusable questions authored by staff.
pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    pub async fn list(
        &self,
        actor: &Claims,
        query: QuestionListQuery,
    ) -> AppResult<Vec<BankQuestionDto>> {
        require_staff(actor)?;

        let filter = QuestionFilter {
            visibility: visibility_for(actor, query.scope.as_deref())?,
            category: query
                .category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        };

        let questions = self.questions.list(filter).await?;
        Ok(questions.into_iter().map(BankQuestionDto::from).collect())
    }

    pub async fn create(
        &self,
        actor: &Claims,
        request: BankQuestionRequest,
    ) -> AppResult<BankQuestionDto> {
        require_staff(actor)?;
        request.validate()?;

        let question = Question::new(
            &request.text,
            trimmed(&request.options),
            request.correct_index,
            &request.category,
            request.scope.unwrap_or_default(),
            &actor.sub,
        );

        let question = self.questions.create(question).await?;
        Ok(BankQuestionDto::from(question))
    }

    pub async fn update(
        &self,
        actor: &Claims,
        question_id: &str,
        request: BankQuestionRequest,
    ) -> AppResult<BankQuestionDto> {
        request.validate()?;
        let mut question = self.find_owned(actor, question_id).await?;

        question.text = request.text.trim().to_string();
        question.options = trimmed(&request.options);
        question.correct_index = request.correct_index;
        question.category = request.category.trim().to_string();
        if let Some(scope) = request.scope {
            question.scope = scope;
        }

        let question = self.questions.update(question).await?;
        Ok(BankQuestionDto::from(question))
    }

    /// Quizzes hold copies, so deleting a bank question never changes a quiz.
    pub async fn delete(&self, actor: &Claims, question_id: &str) -> AppResult<()> {
        let question = self.find_owned(actor, question_id).await?;

        if !self.questions.delete(&question.id).await? {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    async fn find_owned(&self, actor: &Claims, question_id: &str) -> AppResult<Question> {
        require_staff(actor)?;

        let question = self
            .questions
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

        require_owner_or_admin(actor, &question.created_by)?;
        Ok(question)
    }
}

fn visibility_for(actor: &Claims, scope: Option<&str>) -> AppResult<QuestionVisibility> {
    match scope.map(str::trim).unwrap_or("all") {
        "personal" => Ok(QuestionVisibility::OwnedBy(actor.sub.clone())),
        "global" => Ok(QuestionVisibility::Global),
        "all" | "" if actor.role.is_admin() => Ok(QuestionVisibility::Everything),
        "all" | "" => Ok(QuestionVisibility::OwnedOrGlobal(actor.sub.clone())),
        other => Err(AppError::ValidationError(format!(
            "Unknown question scope '{}'",
            other
        ))),
    }
}

fn trimmed(options: &[String]) -> Vec<String> {
    options.iter().map(|o| o.trim().to_string()).collect()
}
