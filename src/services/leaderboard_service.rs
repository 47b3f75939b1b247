use std::{collections::HashSet, sync::Arc};

use crate::{
    auth::{require_admin, Claims},
    errors::{AppError, AppResult},
    models::{
        domain::{Attempt, User},
        dto::response::{LeaderboardEntry, StatsResponse},
    },
    repositories::{AttemptRepository, GroupRepository, QuizRepository, UserRepository},
    services::access_control::authorize_quiz,
};

pub const LEADERBOARD_SIZE: usize = 10;

/// Rankings and platform statistics, recomputed from stored attempts on every call.
pub struct LeaderboardService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
    groups: Arc<dyn GroupRepository>,
    users: Arc<dyn UserRepository>,
}

impl LeaderboardService {
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

    pub async fn leaderboard(
        &self,
        actor: &Claims,
        quiz_id: &str,
        code: Option<&str>,
    ) -> AppResult<Vec<LeaderboardEntry>> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .filter(|quiz| quiz.is_enabled || actor.role.is_admin() || quiz.is_owned_by(&actor.sub))
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        authorize_quiz(self.groups.as_ref(), actor, &quiz, code).await?;

        let attempts = self.attempts.find_by_quiz(&quiz.id).await?;
        let user_ids: Vec<String> = attempts
            .iter()
            .map(|a| a.user_id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users = self.users.find_by_ids(&user_ids).await?;

        Ok(rank_attempts(attempts, &users))
    }

    pub async fn stats(&self, actor: &Claims) -> AppResult<StatsResponse> {
        require_admin(actor)?;

        let users_count = self.users.count().await?;
        let quiz_count = self.quizzes.count().await?;
        let attempts_count = self.attempts.count().await?;
        let average_score = self
            .attempts
            .average_score()
            .await?
            .map(round_to_hundredths)
            .unwrap_or(0.0);

        Ok(StatsResponse {
            users_count,
            quiz_count,
            attempts_count,
            average_score,
        })
    }
}

/// Orders attempts by score (high first), then time taken (fast first), then date
/// (early first), and keeps the top entries. Every attempt is ranked on its own.
pub fn rank_attempts(mut attempts: Vec<Attempt>, users: &[User]) -> Vec<LeaderboardEntry> {
    attempts.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.time_taken_seconds.cmp(&b.time_taken_seconds))
            .then(a.attempt_date.cmp(&b.attempt_date))
    });

    attempts
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, attempt)| {
            let user_name = users
                .iter()
                .find(|u| u.id == attempt.user_id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Unknown user".to_string());

            LeaderboardEntry {
                rank: i + 1,
                user_id: attempt.user_id,
                user_name,
                score: attempt.score,
                time_taken_seconds: attempt.time_taken_seconds,
                attempt_date: attempt.attempt_date,
            }
        })
        .collect()
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
