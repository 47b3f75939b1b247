pub mod attempt;
pub mod group;
pub mod question;
pub mod quiz;
pub mod refresh_token;
pub mod user;

pub use attempt::{Attempt, AttemptAnswer};
pub use group::Group;
pub use question::{Question, QuestionScope};
pub use quiz::{AccessType, Quiz, QuizQuestion};
pub use refresh_token::RefreshToken;
pub use user::{User, UserRole};
