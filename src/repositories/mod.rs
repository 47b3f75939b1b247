pub mod attempt_repository;
pub mod group_repository;
pub mod question_repository;
pub mod quiz_repository;
pub mod refresh_token_repository;
pub mod user_repository;

pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use group_repository::{GroupRepository, MongoGroupRepository};
pub use question_repository::{
    MongoQuestionRepository, QuestionFilter, QuestionRepository, QuestionVisibility,
};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use refresh_token_repository::{MongoRefreshTokenRepository, RefreshTokenRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
