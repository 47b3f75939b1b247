use std::{collections::HashSet, sync::Arc};

use crate::{
    auth::{require_owner_or_admin, require_staff, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{Attempt, AttemptAnswer, Quiz, User},
        dto::{
            request::SubmitAttemptRequest,
            response::{
                AdminAttemptItem, AttemptHistoryItem, AttemptReviewResponse, QuizSummary,
                ReviewItem, SubmitAttemptResponse, UserDto,
            },
        },
    },
    repositories::{AttemptRepository, GroupRepository, QuizRepository, UserRepository},
    services::access_control::authorize_quiz,
};

pub struct AttemptService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

impl AttemptService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
        groups: Arc<dyn GroupRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            quizzes,
            attempts,
            groups,
            users,
        }
    }

    /// Scores a submission against the stored answer key and records it.
    pub async fn submit_attempt(
        &self,
        actor: &Claims,
        quiz_id: &str,
        request: SubmitAttemptRequest,
    ) -> AppResult<SubmitAttemptResponse> {
        let time_taken_seconds = parse_time_taken(request.time_taken_seconds)?;

        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .filter(|quiz| quiz.is_enabled)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        authorize_quiz(
            self.groups.as_ref(),
            actor,
            &quiz,
            request.access_code.as_deref(),
        )
        .await?;

        if quiz.single_attempt
            && self
                .attempts
                .exists_for_user_and_quiz(&actor.sub, &quiz.id)
                .await?
        {
            return Err(AppError::Conflict(
                "You have already attempted this quiz".to_string(),
            ));
        }

        let answers: Vec<AttemptAnswer> = request
            .answers
            .into_iter()
            .map(|a| AttemptAnswer {
                question_id: a.question_id,
                selected_index: a.selected_index,
            })
            .collect();
        let (score, review) = grade_answers(&quiz, &answers);

        let attempt = Attempt::new(
            &actor.sub,
            &quiz.id,
            quiz.single_attempt,
            answers,
            score,
            time_taken_seconds,
        );

        // The store rejects a concurrent duplicate on a single-attempt quiz with Conflict.
        let attempt = self.attempts.create(attempt).await.map_err(|e| match e {
            AppError::Conflict(_) => {
                AppError::Conflict("You have already attempted this quiz".to_string())
            }
            other => other,
        })?;

        log::info!(
            "User {} scored {}/{} on quiz {}",
            actor.sub,
            score,
            quiz.total_marks,
            quiz.id
        );

        Ok(SubmitAttemptResponse {
            attempt_id: attempt.id,
            score,
            total_marks: quiz.total_marks,
            review,
        })
    }

    /// The actor's own attempts, newest first.
    pub async fn my_attempts(&self, actor: &Claims) -> AppResult<Vec<AttemptHistoryItem>> {
        let attempts = self.attempts.find_by_user(&actor.sub).await?;
        let quizzes = self.quizzes.find_by_ids(&distinct_quiz_ids(&attempts)).await?;

        Ok(attempts
            .into_iter()
            .map(|attempt| {
                let quiz = quizzes.iter().find(|q| q.id == attempt.quiz_id);
                AttemptHistoryItem::new(attempt, quiz)
            })
            .collect())
    }

    pub async fn attempt_review(
        &self,
        actor: &Claims,
        attempt_id: &str,
    ) -> AppResult<AttemptReviewResponse> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;

        let quiz = self
            .quizzes
            .find_by_id(&attempt.quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz no longer exists".to_string()))?;

        let is_quiz_owner = actor.role.is_staff() && quiz.is_owned_by(&actor.sub);
        if attempt.user_id != actor.sub && !is_quiz_owner && !actor.role.is_admin() {
            return Err(AppError::Forbidden(
                "You can only review your own attempts".to_string(),
            ));
        }

        let (_, review) = grade_answers(&quiz, &attempt.answers);

        Ok(AttemptReviewResponse {
            attempt_id: attempt.id,
            quiz: QuizSummary::from(&quiz),
            score: attempt.score,
            total_marks: quiz.total_marks,
            time_taken_seconds: attempt.time_taken_seconds,
            attempt_date: attempt.attempt_date,
            review,
        })
    }

    /// Admins see every attempt; teachers see attempts on their own quizzes.
    pub async fn list_attempts(
        &self,
        actor: &Claims,
        quiz_id: Option<&str>,
    ) -> AppResult<Vec<AdminAttemptItem>> {
        require_staff(actor)?;

        let attempts = match quiz_id {
            Some(quiz_id) => {
                let quiz = self
                    .quizzes
                    .find_by_id(quiz_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
                require_owner_or_admin(actor, &quiz.created_by)?;
                self.attempts.find_by_quiz(&quiz.id).await?
            }
            None if actor.role.is_admin() => self.attempts.find_all().await?,
            None => {
                let own: Vec<String> = self
                    .quizzes
                    .find_by_creator(&actor.sub)
                    .await?
                    .into_iter()
                    .map(|q| q.id)
                    .collect();
                self.attempts.find_by_quizzes(&own).await?
            }
        };

        let quizzes = self.quizzes.find_by_ids(&distinct_quiz_ids(&attempts)).await?;
        let user_ids: Vec<String> = attempts
            .iter()
            .map(|a| a.user_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users = self.users.find_by_ids(&user_ids).await?;

        Ok(attempts
            .into_iter()
            .map(|attempt| admin_attempt_item(attempt, &quizzes, &users))
            .collect())
    }
}

/// Scores `answers` against the quiz's key.
///
/// Each question scores at most once: a repeated answer for a question already
/// graded is reported as incorrect. Unknown question ids are incorrect and carry
/// no correct index.
pub fn grade_answers(quiz: &Quiz, answers: &[AttemptAnswer]) -> (u32, Vec<ReviewItem>) {
    let mut graded = HashSet::new();
    let mut score = 0;

    let review = answers
        .iter()
        .map(|answer| {
            let correct_index = quiz
                .find_question(&answer.question_id)
                .map(|q| q.correct_index);
            let first_for_question = graded.insert(answer.question_id.as_str());
            let is_correct = first_for_question
                && correct_index
                    .map(|c| usize::try_from(answer.selected_index).ok() == Some(c))
                    .unwrap_or(false);

            if is_correct {
                score += quiz.marks_per_question;
            }

            ReviewItem {
                question_id: answer.question_id.clone(),
                selected_index: answer.selected_index,
                correct_index,
                is_correct,
            }
        })
        .collect();

    (score, review)
}

fn parse_time_taken(value: Option<i64>) -> AppResult<u32> {
    match value {
        None => Ok(0),
        Some(seconds) if seconds < 0 => Err(AppError::ValidationError(
            "Time taken cannot be negative".to_string(),
        )),
        Some(seconds) => u32::try_from(seconds)
            .map_err(|_| AppError::ValidationError("Time taken is too large".to_string())),
    }
}

fn distinct_quiz_ids(attempts: &[Attempt]) -> Vec<String> {
    attempts
        .iter()
        .map(|a| a.quiz_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect()
}

fn admin_attempt_item(attempt: Attempt, quizzes: &[Quiz], users: &[User]) -> AdminAttemptItem {
    AdminAttemptItem {
        user: users
            .iter()
            .find(|u| u.id == attempt.user_id)
            .cloned()
            .map(UserDto::from),
        quiz: quizzes
            .iter()
            .find(|q| q.id == attempt.quiz_id)
            .map(QuizSummary::from),
        id: attempt.id,
        score: attempt.score,
        time_taken_seconds: attempt.time_taken_seconds,
        attempt_date: attempt.attempt_date,
    }
}
