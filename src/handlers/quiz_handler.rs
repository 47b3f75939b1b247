use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{AccessCodeQuery, RedeemCodeRequest, ScopeQuery, SubmitAttemptRequest},
};

#[get("/api/quizzes")]
pub async fn list_quizzes(
    state: web::Data<Arc<AppState>>,
    query: web::Query<ScopeQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state
        .quiz_service
        .list_available(&auth.0, query.scope.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[post("/api/quizzes/access")]
pub async fn redeem_code(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RedeemCodeRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let quiz = state.quiz_service.redeem_code(&auth.0, &request.code).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[get("/api/quizzes/attempts/me")]
pub async fn my_attempts(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempts = state.attempt_service.my_attempts(&auth.0).await?;
    Ok(HttpResponse::Ok().json(attempts))
}

#[get("/api/quizzes/attempts/{id}")]
pub async fn attempt_review(
    state: web::Data<Arc<AppState>>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let review = state
        .attempt_service
        .attempt_review(&auth.0, &attempt_id)
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

#[get("/api/quizzes/{id}")]
pub async fn get_quiz(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    query: web::Query<AccessCodeQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .get_for_attempt(&auth.0, &quiz_id, query.code.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[post("/api/quizzes/{id}/attempt")]
pub async fn submit_attempt(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    request: web::Json<SubmitAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .attempt_service
        .submit_attempt(&auth.0, &quiz_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(result))
}

#[get("/api/quizzes/{id}/leaderboard")]
pub async fn leaderboard(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    query: web::Query<AccessCodeQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let entries = state
        .leaderboard_service
        .leaderboard(&auth.0, &quiz_id, query.code.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}
