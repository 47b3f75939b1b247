pub mod access_control;
pub mod attempt_service;
pub mod auth_service;
pub mod group_service;
pub mod leaderboard_service;
pub mod question_service;
pub mod quiz_service;

pub use attempt_service::AttemptService;
pub use auth_service::AuthService;
pub use group_service::GroupService;
pub use leaderboard_service::LeaderboardService;
pub use question_service::QuestionService;
pub use quiz_service::QuizService;
