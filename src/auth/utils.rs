use crate::{
    auth::Claims,
    errors::{AppError, AppResult},
    models::domain::UserRole,
};

pub fn require_admin(claims: &Claims) -> AppResult<()> {
    match claims.role {
        UserRole::Admin => Ok(()),
        UserRole::Teacher | UserRole::Student => {
            Err(AppError::Forbidden("Only admins can perform this action".to_string()))
        }
    }
}

pub fn require_staff(claims: &Claims) -> AppResult<()> {
    if !claims.role.is_staff() {
        return Err(AppError::Forbidden(
            "Only teachers and admins can perform this action".to_string(),
        ));
    }
    Ok(())
}

/// Admins act on anything; everyone else only on what they created.
pub fn require_owner_or_admin(claims: &Claims, resource_owner: &str) -> AppResult<()> {
    if !claims.role.is_admin() && claims.sub != resource_owner {
        return Err(AppError::Forbidden(
            "You can only manage your own resources".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub fn test_claims(user_id: &str, role: UserRole) -> Claims {
    Claims {
        sub: user_id.to_string(),
        name: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        role,
        iss: crate::auth::claims::TOKEN_ISSUER.to_string(),
        iat: 0,
        exp: 9999999999,
    }
}
