use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{LoginRequest, RefreshTokenRequest, RegisterRequest},
        response::MessageResponse,
    },
};

#[post("/api/auth/register")]
pub async fn register(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.register(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/api/auth/login")]
pub async fn login(
    state: web::Data<Arc<AppState>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.auth_service.login(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/auth/refresh")]
pub async fn refresh_token(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state
        .auth_service
        .refresh(&request.into_inner().refresh_token)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/auth/logout")]
pub async fn logout(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.auth_service.logout(&auth.0).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out")))
}

#[get("/api/auth/me")]
pub async fn me(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let session = state.auth_service.me(&auth.0).await?;
    Ok(HttpResponse::Ok().json(session))
}
