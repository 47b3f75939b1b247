#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::RwLock;

use quizdesk_server::{
    app_state::{AppState, Repositories},
    auth::Claims,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{Attempt, Group, Question, Quiz, QuizQuestion, RefreshToken, User, UserRole},
    repositories::{
        AttemptRepository, GroupRepository, QuestionFilter, QuestionRepository, QuizRepository,
        RefreshTokenRepository, UserRepository,
    },
};

type Store<T> = Arc<RwLock<HashMap<String, T>>>;

fn store<T>() -> Store<T> {
    Arc::new(RwLock::new(HashMap::new()))
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Store<User>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Record already exists".to_string()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuizRepository {
    quizzes: Store<Quiz>,
}

impl InMemoryQuizRepository {
    async fn sorted(&self, keep: impl Fn(&Quiz) -> bool) -> Vec<Quiz> {
        let quizzes = self.quizzes.read().await;
        let mut items: Vec<Quiz> = quizzes.values().filter(|q| keep(q)).cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        self.quizzes
            .write()
            .await
            .insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(ids.iter().filter_map(|id| quizzes.get(id).cloned()).collect())
    }

    async fn find_enabled(&self) -> AppResult<Vec<Quiz>> {
        Ok(self.sorted(|q| q.is_enabled).await)
    }

    async fn find_all(&self) -> AppResult<Vec<Quiz>> {
        Ok(self.sorted(|_| true).await)
    }

    async fn find_by_creator(&self, user_id: &str) -> AppResult<Vec<Quiz>> {
        Ok(self.sorted(|q| q.created_by == user_id).await)
    }

    async fn find_enabled_by_code_hash(&self, code_hash: &str) -> AppResult<Option<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .find(|q| q.is_enabled && q.access_code_hash.as_deref() == Some(code_hash))
            .cloned())
    }

    async fn update(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut quizzes = self.quizzes.write().await;
        if !quizzes.contains_key(&quiz.id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> AppResult<()> {
        let mut quizzes = self.quizzes.write().await;
        let quiz = quizzes
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
        quiz.is_enabled = enabled;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.quizzes.write().await.remove(id).is_some())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.quizzes.read().await.len() as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Mirrors the unique partial index on single-attempt submissions.
#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: Store<Attempt>,
}

impl InMemoryAttemptRepository {
    async fn sorted(&self, keep: impl Fn(&Attempt) -> bool) -> Vec<Attempt> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<Attempt> = attempts.values().filter(|a| keep(a)).cloned().collect();
        items.sort_by(|a, b| b.attempt_date.cmp(&a.attempt_date));
        items
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;
        let duplicate = attempt.single_attempt
            && attempts.values().any(|a| {
                a.single_attempt && a.user_id == attempt.user_id && a.quiz_id == attempt.quiz_id
            });
        if duplicate {
            return Err(AppError::Conflict("Record already exists".to_string()));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn exists_for_user_and_quiz(&self, user_id: &str, quiz_id: &str) -> AppResult<bool> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .any(|a| a.user_id == user_id && a.quiz_id == quiz_id))
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<Attempt>> {
        Ok(self.sorted(|a| a.user_id == user_id).await)
    }

    async fn find_by_quiz(&self, quiz_id: &str) -> AppResult<Vec<Attempt>> {
        Ok(self.sorted(|a| a.quiz_id == quiz_id).await)
    }

    async fn find_by_quizzes(&self, quiz_ids: &[String]) -> AppResult<Vec<Attempt>> {
        Ok(self.sorted(|a| quiz_ids.contains(&a.quiz_id)).await)
    }

    async fn find_all(&self) -> AppResult<Vec<Attempt>> {
        Ok(self.sorted(|_| true).await)
    }

    async fn delete_by_quiz(&self, quiz_id: &str) -> AppResult<u64> {
        let mut attempts = self.attempts.write().await;
        let before = attempts.len();
        attempts.retain(|_, a| a.quiz_id != quiz_id);
        Ok((before - attempts.len()) as u64)
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.attempts.read().await.len() as u64)
    }

    async fn average_score(&self) -> AppResult<Option<f64>> {
        let attempts = self.attempts.read().await;
        if attempts.is_empty() {
            return Ok(None);
        }
        let total: u64 = attempts.values().map(|a| a.score as u64).sum();
        Ok(Some(total as f64 / attempts.len() as f64))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Store<Group>,
}

impl InMemoryGroupRepository {
    async fn filtered(&self, keep: impl Fn(&Group) -> bool) -> Vec<Group> {
        let groups = self.groups.read().await;
        groups.values().filter(|g| keep(g)).cloned().collect()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn create(&self, group: Group) -> AppResult<Group> {
        let mut groups = self.groups.write().await;
        if groups.values().any(|g| g.code == group.code) {
            return Err(AppError::Conflict("Record already exists".to_string()));
        }
        groups.insert(group.id.clone(), group.clone());
        Ok(group)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Group>> {
        Ok(self.groups.read().await.get(id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Group>> {
        Ok(self.filtered(|g| g.code == code).await.into_iter().next())
    }

    async fn code_exists(&self, code: &str) -> AppResult<bool> {
        Ok(!self.filtered(|g| g.code == code).await.is_empty())
    }

    async fn find_all(&self) -> AppResult<Vec<Group>> {
        Ok(self.filtered(|_| true).await)
    }

    async fn find_by_owner(&self, user_id: &str) -> AppResult<Vec<Group>> {
        Ok(self.filtered(|g| g.created_by == user_id).await)
    }

    async fn find_by_member(&self, user_id: &str) -> AppResult<Vec<Group>> {
        Ok(self.filtered(|g| g.is_member(user_id)).await)
    }

    async fn group_ids_for_member(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .find_by_member(user_id)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect())
    }

    async fn add_member(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
        if !group.is_member(user_id) {
            group.members.push(user_id.to_string());
        }
        Ok(())
    }

    async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;
        let before = group.members.len();
        group.members.retain(|m| m != user_id);
        Ok(group.members.len() != before)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.groups.write().await.remove(id).is_some())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: Store<Question>,
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        self.questions
            .write()
            .await
            .insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        Ok(self.questions.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn list(&self, filter: QuestionFilter) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(questions.values().filter(|q| filter.matches(q)).cloned().collect())
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let mut questions = self.questions.write().await;
        if !questions.contains_key(&question.id) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        questions.insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.questions.write().await.remove(id).is_some())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Store<RefreshToken>,
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn create(&self, token: RefreshToken) -> AppResult<RefreshToken> {
        self.tokens
            .write()
            .await
            .insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_by_token_hash(&self, hash: &str) -> AppResult<Option<RefreshToken>> {
        Ok(self.tokens.read().await.get(hash).cloned())
    }

    async fn revoke_by_token_hash(&self, hash: &str) -> AppResult<()> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .get_mut(hash)
            .ok_or_else(|| AppError::NotFound("Refresh token not found".to_string()))?;
        token.revoked = true;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let mut tokens = self.tokens.write().await;
        let mut revoked = 0;
        for token in tokens.values_mut().filter(|t| t.user_id == user_id && !t.revoked) {
            token.revoked = true;
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

pub fn in_memory_repositories() -> Repositories {
    Repositories {
        users: Arc::new(InMemoryUserRepository::default()),
        quizzes: Arc::new(InMemoryQuizRepository::default()),
        attempts: Arc::new(InMemoryAttemptRepository::default()),
        groups: Arc::new(InMemoryGroupRepository::default()),
        questions: Arc::new(InMemoryQuestionRepository::default()),
        refresh_tokens: Arc::new(InMemoryRefreshTokenRepository::default()),
    }
}

pub fn test_config() -> Config {
    let mut config = Config::from_env();
    config.admin_secret = Some(SecretString::from("admin-secret".to_string()));
    config.teacher_secret = None;
    config
}

/// Application state over in-memory storage, with the repositories kept for seeding.
pub struct Harness {
    pub state: AppState,
    pub repos: Repositories,
}

impl Harness {
    pub fn new() -> Self {
        let repos = in_memory_repositories();
        let state = AppState::from_repositories(test_config(), repos.clone());
        Self { state, repos }
    }

    /// Stores a user and returns it with an `Authorization` header value.
    pub async fn seed_user(&self, name: &str, role: UserRole) -> (User, String) {
        let user = User::new(
            name,
            &format!("{}@example.com", name.to_lowercase()),
            "not-a-real-hash",
            role,
        );
        let user = self.repos.users.create(user).await.unwrap();
        let token = self.state.jwt_service.create_token(&user).unwrap();
        (user, format!("Bearer {}", token))
    }

    pub fn claims_for(user: &User) -> Claims {
        Claims::new(user, 1)
    }

    pub async fn seed_quiz(&self, quiz: Quiz) -> Quiz {
        self.repos.quizzes.create(quiz).await.unwrap()
    }
}

/// Three questions keyed [0, 2, 1].
pub fn sample_quiz(owner_id: &str) -> Quiz {
    let questions = vec![
        QuizQuestion::new("2 + 2?", options(&["4", "5", "6"]), 0),
        QuizQuestion::new("Capital of France?", options(&["Rome", "Berlin", "Paris"]), 2),
        QuizQuestion::new("Largest planet?", options(&["Mars", "Jupiter", "Venus"]), 1),
    ];
    Quiz::new("General knowledge", "Trivia", 10, 1, questions, owner_id)
}

fn options(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
