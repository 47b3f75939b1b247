use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use rand::{seq::SliceRandom, Rng};
use validator::Validate;

use crate::{
    auth::{require_owner_or_admin, require_staff, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{
            group::{generate_code, normalize_code},
            AccessType, Question, QuestionScope, Quiz, QuizQuestion,
        },
        dto::{
            request::{AddFromBankRequest, QuestionInput, QuizRequest},
            response::{
                ManagedQuizDto, QuestionForTaking, QuizForTaking, QuizSummary, ToggleResponse,
            },
        },
    },
    repositories::{AttemptRepository, GroupRepository, QuestionRepository, QuizRepository},
    services::access_control::{authorize_quiz, hash_access_code, resolve_access},
};

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    groups: Arc<dyn GroupRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        groups: Arc<dyn GroupRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            groups,
            questions,
        }
    }

    /// Enabled quizzes the actor may open without a code. `scope=global` narrows to global quizzes.
    pub async fn list_available(
        &self,
        actor: &Claims,
        scope: Option<&str>,
    ) -> AppResult<Vec<QuizSummary>> {
        let global_only = matches!(scope, Some(s) if s.eq_ignore_ascii_case("global"));
        let member_group_ids = self.groups.group_ids_for_member(&actor.sub).await?;

        let quizzes = self.quizzes.find_enabled().await?;
        Ok(quizzes
            .iter()
            .filter(|quiz| !global_only || quiz.access_type == AccessType::Global)
            .filter(|quiz| resolve_access(actor, quiz, &member_group_ids, None).is_allowed())
            .map(QuizSummary::from)
            .collect())
    }

    pub async fn get_for_attempt(
        &self,
        actor: &Claims,
        quiz_id: &str,
        code: Option<&str>,
    ) -> AppResult<QuizForTaking> {
        let quiz = self.find_enabled(quiz_id).await?;
        authorize_quiz(self.groups.as_ref(), actor, &quiz, code).await?;

        let attempted = self
            .attempts
            .exists_for_user_and_quiz(&actor.sub, &quiz.id)
            .await?;

        Ok(quiz_for_taking(quiz, attempted, &mut rand::rng()))
    }

    /// Looks up the enabled quiz a code unlocks.
    pub async fn redeem_code(&self, actor: &Claims, code: &str) -> AppResult<QuizSummary> {
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(AppError::ValidationError("Access code required".to_string()));
        }

        let quiz = self
            .quizzes
            .find_enabled_by_code_hash(&hash_access_code(&code))
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid access code".to_string()))?;

        log::info!("User {} redeemed access code for quiz {}", actor.sub, quiz.id);
        Ok(QuizSummary::from(&quiz))
    }

    pub async fn list_managed(&self, actor: &Claims) -> AppResult<Vec<ManagedQuizDto>> {
        require_staff(actor)?;

        let quizzes = if actor.role.is_admin() {
            self.quizzes.find_all().await?
        } else {
            self.quizzes.find_by_creator(&actor.sub).await?
        };

        Ok(quizzes.into_iter().map(ManagedQuizDto::from).collect())
    }

    pub async fn get_managed(&self, actor: &Claims, quiz_id: &str) -> AppResult<ManagedQuizDto> {
        let quiz = self.find_managed(actor, quiz_id).await?;
        Ok(ManagedQuizDto::from(quiz))
    }

    pub async fn create(&self, actor: &Claims, request: QuizRequest) -> AppResult<ManagedQuizDto> {
        require_staff(actor)?;
        request.validate()?;

        let mut quiz = Quiz::new(
            &request.title,
            &request.category,
            request.time_limit_minutes,
            request.marks_per_question.unwrap_or(1),
            build_questions(request.questions, &[]),
            &actor.sub,
        );
        quiz.is_enabled = request.is_enabled.unwrap_or(true);
        quiz.single_attempt = request.single_attempt.unwrap_or(true);

        self.apply_access_settings(
            actor,
            &mut quiz,
            request.access_type.unwrap_or_default(),
            request.access_code,
            request.group_id,
        )
        .await?;

        let quiz = self.quizzes.create(quiz).await?;
        log::info!("User {} created quiz {}", actor.sub, quiz.id);
        Ok(ManagedQuizDto::from(quiz))
    }

    pub async fn update(
        &self,
        actor: &Claims,
        quiz_id: &str,
        request: QuizRequest,
    ) -> AppResult<ManagedQuizDto> {
        request.validate()?;
        let mut quiz = self.find_managed(actor, quiz_id).await?;

        quiz.title = request.title.trim().to_string();
        quiz.category = request.category.trim().to_string();
        quiz.time_limit_minutes = request.time_limit_minutes;
        if let Some(marks) = request.marks_per_question {
            quiz.marks_per_question = marks.max(1);
        }
        quiz.questions = build_questions(request.questions, &quiz.questions);
        if let Some(is_enabled) = request.is_enabled {
            quiz.is_enabled = is_enabled;
        }
        if let Some(single_attempt) = request.single_attempt {
            quiz.single_attempt = single_attempt;
        }

        let access_type = request.access_type.unwrap_or(quiz.access_type);
        self.apply_access_settings(
            actor,
            &mut quiz,
            access_type,
            request.access_code,
            request.group_id,
        )
        .await?;

        quiz.recompute_total_marks();
        quiz.modified_at = Some(Utc::now());

        let quiz = self.quizzes.update(quiz).await?;
        Ok(ManagedQuizDto::from(quiz))
    }

    pub async fn toggle(&self, actor: &Claims, quiz_id: &str) -> AppResult<ToggleResponse> {
        let quiz = self.find_managed(actor, quiz_id).await?;
        let is_enabled = !quiz.is_enabled;

        // Another quiz may have taken the code while this one was disabled.
        if is_enabled && quiz.access_type == AccessType::Code {
            if let Some(code_hash) = &quiz.access_code_hash {
                self.ensure_code_available(&quiz.id, code_hash).await?;
            }
        }

        self.quizzes.set_enabled(&quiz.id, is_enabled).await?;
        log::info!("Quiz {} is_enabled set to {}", quiz.id, is_enabled);
        Ok(ToggleResponse { is_enabled })
    }

    /// Removes the quiz, then its attempts. The second step is best-effort.
    pub async fn delete(&self, actor: &Claims, quiz_id: &str) -> AppResult<()> {
        let quiz = self.find_managed(actor, quiz_id).await?;

        if !self.quizzes.delete(&quiz.id).await? {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }

        match self.attempts.delete_by_quiz(&quiz.id).await {
            Ok(removed) => log::info!("Deleted quiz {} and {} attempts", quiz.id, removed),
            Err(e) => log::error!("Quiz {} deleted but its attempts were not: {}", quiz.id, e),
        }
        Ok(())
    }

    /// Copies bank questions into the quiz by value. Each copy gets a fresh id.
    pub async fn add_from_bank(
        &self,
        actor: &Claims,
        quiz_id: &str,
        request: AddFromBankRequest,
    ) -> AppResult<ManagedQuizDto> {
        request.validate()?;
        let mut quiz = self.find_managed(actor, quiz_id).await?;

        let found = self.questions.find_by_ids(&request.question_ids).await?;
        for id in &request.question_ids {
            let question = found
                .iter()
                .find(|q| &q.id == id)
                .filter(|q| can_use_question(actor, q))
                .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", id)))?;
            quiz.questions.push(question.to_quiz_question());
        }

        quiz.recompute_total_marks();
        quiz.modified_at = Some(Utc::now());

        let quiz = self.quizzes.update(quiz).await?;
        Ok(ManagedQuizDto::from(quiz))
    }

    async fn find_enabled(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(quiz_id)
            .await?
            .filter(|quiz| quiz.is_enabled)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    async fn find_managed(&self, actor: &Claims, quiz_id: &str) -> AppResult<Quiz> {
        require_staff(actor)?;

        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        require_owner_or_admin(actor, &quiz.created_by)?;
        Ok(quiz)
    }

    async fn apply_access_settings(
        &self,
        actor: &Claims,
        quiz: &mut Quiz,
        access_type: AccessType,
        access_code: Option<String>,
        group_id: Option<String>,
    ) -> AppResult<()> {
        match access_type {
            AccessType::Global => {
                quiz.access_code = None;
                quiz.access_code_hash = None;
                quiz.group_id = None;
            }
            AccessType::Group => {
                let group_id = group_id
                    .filter(|g| !g.trim().is_empty())
                    .or_else(|| quiz.group_id.clone())
                    .ok_or_else(|| {
                        AppError::ValidationError("A group quiz needs a group".to_string())
                    })?;

                let group = self
                    .groups
                    .find_by_id(&group_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

                if !actor.role.is_admin() && !group.is_owner(&actor.sub) {
                    return Err(AppError::Forbidden(
                        "You can only restrict quizzes to your own groups".to_string(),
                    ));
                }

                quiz.group_id = Some(group.id);
                quiz.access_code = None;
                quiz.access_code_hash = None;
            }
            AccessType::Code => {
                let code = access_code
                    .map(|c| normalize_code(&c))
                    .filter(|c| !c.is_empty())
                    .or_else(|| quiz.access_code.clone())
                    .unwrap_or_else(|| generate_code(&mut rand::rng()));
                let code_hash = hash_access_code(&code);

                self.ensure_code_available(&quiz.id, &code_hash).await?;

                quiz.access_code = Some(code);
                quiz.access_code_hash = Some(code_hash);
                quiz.group_id = None;
            }
        }

        quiz.access_type = access_type;
        Ok(())
    }

    /// Conflict when an enabled quiz other than `quiz_id` already answers to this code.
    async fn ensure_code_available(&self, quiz_id: &str, code_hash: &str) -> AppResult<()> {
        match self.quizzes.find_enabled_by_code_hash(code_hash).await? {
            Some(other) if other.id != quiz_id => {
                Err(AppError::Conflict("Access code already in use".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Builds the student-facing payload: questions shuffled, answer key removed.
pub fn quiz_for_taking<R: Rng + ?Sized>(quiz: Quiz, attempted: bool, rng: &mut R) -> QuizForTaking {
    let mut questions = quiz.questions;
    shuffle_questions(&mut questions, rng);

    QuizForTaking {
        id: quiz.id,
        title: quiz.title,
        category: quiz.category,
        time_limit_minutes: quiz.time_limit_minutes,
        total_marks: quiz.total_marks,
        single_attempt: quiz.single_attempt,
        attempted,
        questions: questions.into_iter().map(QuestionForTaking::from).collect(),
    }
}

/// Uniform reordering of whole questions; options stay in place.
pub fn shuffle_questions<R: Rng + ?Sized>(questions: &mut [QuizQuestion], rng: &mut R) {
    questions.shuffle(rng);
}

/// Turns submitted questions into quiz questions, reusing ids the quiz already has.
/// An id claimed twice keeps only its first claimant; later copies get fresh ids.
fn build_questions(inputs: Vec<QuestionInput>, existing: &[QuizQuestion]) -> Vec<QuizQuestion> {
    let mut claimed = HashSet::new();

    inputs
        .into_iter()
        .map(|input| {
            let options = input.options.iter().map(|o| o.trim().to_string()).collect();
            let mut question = QuizQuestion::new(&input.text, options, input.correct_index);

            if let Some(id) = input
                .id
                .filter(|id| existing.iter().any(|q| &q.id == id))
                .filter(|id| claimed.insert(id.clone()))
            {
                question.id = id;
            }
            question
        })
        .collect()
}

fn can_use_question(actor: &Claims, question: &Question) -> bool {
    actor.role.is_admin()
        || question.scope == QuestionScope::Global
        || question.created_by == actor.sub
}
