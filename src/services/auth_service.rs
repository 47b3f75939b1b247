use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use validator::Validate;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        Claims, JwtService,
    },
    errors::{AppError, AppResult},
    models::{
        domain::{
            refresh_token::hash_token,
            user::normalize_email,
            RefreshToken, User, UserRole,
        },
        dto::{
            request::{LoginRequest, RegisterRequest},
            response::{AuthResponse, RefreshTokenResponse, SessionDto, UserDto},
        },
    },
    repositories::{RefreshTokenRepository, UserRepository},
    services::access_control::constant_time_eq,
};

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    jwt: JwtService,
    admin_secret: Option<SecretString>,
    teacher_secret: Option<SecretString>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        jwt: JwtService,
        admin_secret: Option<SecretString>,
        teacher_secret: Option<SecretString>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
            admin_secret,
            teacher_secret,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let role = self.resolve_role(&request)?;
        let email = normalize_email(&request.email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(User::new(&request.name, &email, &password_hash, role))
            .await?;

        log::info!("Registered {} {}", user.role.as_str(), user.id);
        self.issue_tokens(user).await
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .users
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password_hash)? {
            log::warn!("Failed login for user {}", user.id);
            return Err(invalid());
        }

        self.issue_tokens(user).await
    }

    /// Rotates a refresh token: the presented one is revoked and a new pair is issued.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshTokenResponse> {
        let claims = self.jwt.validate_refresh_token(refresh_token)?;
        let token_hash = hash_token(refresh_token);

        let stored = self
            .refresh_tokens
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Refresh token not recognised".to_string()))?;

        if !stored.is_valid() || stored.user_id != claims.sub {
            return Err(AppError::Unauthorized(
                "Refresh token has been revoked".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        self.refresh_tokens.revoke_by_token_hash(&token_hash).await?;

        let issued = self.issue_tokens(user).await?;
        Ok(RefreshTokenResponse {
            token: issued.token,
            refresh_token: issued.refresh_token,
        })
    }

    pub async fn logout(&self, actor: &Claims) -> AppResult<()> {
        let revoked = self.refresh_tokens.revoke_all_for_user(&actor.sub).await?;
        log::info!("User {} logged out, {} refresh tokens revoked", actor.sub, revoked);
        Ok(())
    }

    pub async fn me(&self, actor: &Claims) -> AppResult<SessionDto> {
        let user = self
            .users
            .find_by_id(&actor.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        Ok(SessionDto {
            id: user.id,
            role: user.role,
            name: user.name,
        })
    }

    fn resolve_role(&self, request: &RegisterRequest) -> AppResult<UserRole> {
        let requested = request
            .role
            .as_deref()
            .map(|r| r.trim().to_lowercase())
            .unwrap_or_default();

        match requested.as_str() {
            "admin" => {
                if secret_matches(&self.admin_secret, request.admin_secret.as_deref()) {
                    Ok(UserRole::Admin)
                } else {
                    Err(AppError::Forbidden("Invalid admin secret".to_string()))
                }
            }
            "teacher" => match &self.teacher_secret {
                None => Ok(UserRole::Teacher),
                Some(_) if secret_matches(&self.teacher_secret, request.teacher_secret.as_deref()) => {
                    Ok(UserRole::Teacher)
                }
                Some(_) => Err(AppError::Forbidden("Invalid teacher secret".to_string())),
            },
            _ => Ok(UserRole::Student),
        }
    }

    async fn issue_tokens(&self, user: User) -> AppResult<AuthResponse> {
        let token = self.jwt.create_token(&user)?;
        let refresh_token = self.jwt.create_refresh_token(&user.id)?;

        let expires_at = Utc::now() + Duration::hours(self.jwt.refresh_expiration_hours());
        self.refresh_tokens
            .create(RefreshToken::new(&user.id, hash_token(&refresh_token), expires_at))
            .await?;

        Ok(AuthResponse {
            user: UserDto::from(user),
            token,
            refresh_token,
        })
    }
}

/// An unset secret never matches.
fn secret_matches(configured: &Option<SecretString>, supplied: Option<&str>) -> bool {
    match (configured, supplied) {
        (Some(expected), Some(supplied)) => {
            constant_time_eq(expected.expose_secret().as_bytes(), supplied.as_bytes())
        }
        _ => false,
    }
}
