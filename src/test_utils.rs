#[cfg(test)]
pub mod fixtures {
    use std::sync::Arc;

    use crate::{
        app_state::{AppState, Repositories},
        config::Config,
        models::domain::{User, UserRole},
        repositories::{
            attempt_repository::MockAttemptRepository, group_repository::MockGroupRepository,
            question_repository::MockQuestionRepository, quiz_repository::MockQuizRepository,
            refresh_token_repository::MockRefreshTokenRepository,
            user_repository::MockUserRepository,
        },
    };

    /// A user with the given role and an address derived from its name.
    pub fn test_user(name: &str, role: UserRole) -> User {
        User::new(
            name,
            &format!("{}@example.com", name.to_lowercase()),
            "not-a-real-hash",
            role,
        )
    }

    /// Repositories that panic on any call. For routes expected to fail before touching storage.
    pub fn mock_repositories() -> Repositories {
        Repositories {
            users: Arc::new(MockUserRepository::new()),
            quizzes: Arc::new(MockQuizRepository::new()),
            attempts: Arc::new(MockAttemptRepository::new()),
            groups: Arc::new(MockGroupRepository::new()),
            questions: Arc::new(MockQuestionRepository::new()),
            refresh_tokens: Arc::new(MockRefreshTokenRepository::new()),
        }
    }

    pub fn state_without_expectations() -> AppState {
        AppState::from_repositories(Config::test_config(), mock_repositories())
    }

    /// An `Authorization` header value for a fresh user with `role`.
    pub fn bearer_for(state: &AppState, role: UserRole) -> String {
        let user = test_user(role.as_str(), role);
        let token = state
            .jwt_service
            .create_token(&user)
            .expect("token should be created");
        format!("Bearer {}", token)
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::models::domain::UserRole;

    #[test]
    fn test_fixtures_test_user() {
        let user = test_user("Ada", UserRole::Teacher);
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, UserRole::Teacher);
    }

    #[test]
    fn test_bearer_for_builds_header() {
        let state = state_without_expectations();
        let header = bearer_for(&state, UserRole::Student);

        let token = header.strip_prefix("Bearer ").unwrap();
        let claims = state.jwt_service.validate_token(token).unwrap();
        assert_eq!(claims.role, UserRole::Student);
    }
}
