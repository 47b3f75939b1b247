use std::sync::Arc;

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AttemptRepository, GroupRepository, MongoAttemptRepository, MongoGroupRepository,
        MongoQuestionRepository, MongoQuizRepository, MongoRefreshTokenRepository,
        MongoUserRepository, QuestionRepository, QuizRepository, RefreshTokenRepository,
        UserRepository,
    },
    services::{
        AttemptService, AuthService, GroupService, LeaderboardService, QuestionService,
        QuizService,
    },
};

/// The repositories every service is built from.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl Repositories {
    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(db)),
            quizzes: Arc::new(MongoQuizRepository::new(db)),
            attempts: Arc::new(MongoAttemptRepository::new(db)),
            groups: Arc::new(MongoGroupRepository::new(db)),
            questions: Arc::new(MongoQuestionRepository::new(db)),
            refresh_tokens: Arc::new(MongoRefreshTokenRepository::new(db)),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.users.ensure_indexes().await?;
        self.quizzes.ensure_indexes().await?;
        self.attempts.ensure_indexes().await?;
        self.groups.ensure_indexes().await?;
        self.questions.ensure_indexes().await?;
        self.refresh_tokens.ensure_indexes().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub quiz_service: Arc<QuizService>,
    pub attempt_service: Arc<AttemptService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub group_service: Arc<GroupService>,
    pub question_service: Arc<QuestionService>,
    pub jwt_service: JwtService,
    /// None when the state was built without a live database (tests).
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let repositories = Repositories::mongo(&db);
        repositories.ensure_indexes().await?;

        let mut state = Self::from_repositories(config, repositories);
        state.db = Some(db);
        Ok(state)
    }

    pub fn from_repositories(config: Config, repos: Repositories) -> Self {
        let jwt_service = JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
            config.refresh_expiration_hours,
        );

        let auth_service = Arc::new(AuthService::new(
            repos.users.clone(),
            repos.refresh_tokens.clone(),
            jwt_service.clone(),
            config.admin_secret.clone(),
            config.teacher_secret.clone(),
        ));
        let quiz_service = Arc::new(QuizService::new(
            repos.quizzes.clone(),
            repos.attempts.clone(),
            repos.groups.clone(),
            repos.questions.clone(),
        ));
        let attempt_service = Arc::new(AttemptService::new(
            repos.quizzes.clone(),
            repos.attempts.clone(),
            repos.groups.clone(),
            repos.users.clone(),
        ));
        let leaderboard_service = Arc::new(LeaderboardService::new(
            repos.quizzes.clone(),
            repos.attempts.clone(),
            repos.groups.clone(),
            repos.users.clone(),
        ));
        let group_service = Arc::new(GroupService::new(repos.groups.clone(), repos.users.clone()));
        let question_service = Arc::new(QuestionService::new(repos.questions));

        Self {
            auth_service,
            quiz_service,
            attempt_service,
            leaderboard_service,
            group_service,
            question_service,
            jwt_service,
            db: None,
            config: Arc::new(config),
        }
    }
}
