use std::sync::Arc;

use actix_web::{delete, get, patch, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{
            AddFromBankRequest, AttemptListQuery, BankQuestionRequest, QuestionListQuery,
            QuizRequest,
        },
        response::MessageResponse,
    },
};

#[get("/api/admin/quizzes")]
pub async fn list_managed_quizzes(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state.quiz_service.list_managed(&auth.0).await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[post("/api/admin/quizzes")]
pub async fn create_quiz(
    state: web::Data<Arc<AppState>>,
    request: web::Json<QuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .create(&auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

#[get("/api/admin/quizzes/{id}")]
pub async fn get_managed_quiz(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_managed(&auth.0, &quiz_id).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[put("/api/admin/quizzes/{id}")]
pub async fn update_quiz(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    request: web::Json<QuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .update(&auth.0, &quiz_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[patch("/api/admin/quizzes/{id}/toggle")]
pub async fn toggle_quiz(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let toggled = state.quiz_service.toggle(&auth.0, &quiz_id).await?;
    Ok(HttpResponse::Ok().json(toggled))
}

#[delete("/api/admin/quizzes/{id}")]
pub async fn delete_quiz(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.quiz_service.delete(&auth.0, &quiz_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Quiz deleted")))
}

#[post("/api/admin/quizzes/{id}/questions")]
pub async fn add_questions_from_bank(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    request: web::Json<AddFromBankRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .add_from_bank(&auth.0, &quiz_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[get("/api/admin/attempts")]
pub async fn list_attempts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<AttemptListQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempts = state
        .attempt_service
        .list_attempts(&auth.0, query.quiz_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(attempts))
}

#[get("/api/admin/stats")]
pub async fn stats(
    state: web::Data<Arc<AppState>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let stats = state.leaderboard_service.stats(&auth.0).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/api/admin/questions")]
pub async fn list_bank_questions(
    state: web::Data<Arc<AppState>>,
    query: web::Query<QuestionListQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let questions = state
        .question_service
        .list(&auth.0, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[post("/api/admin/questions")]
pub async fn create_bank_question(
    state: web::Data<Arc<AppState>>,
    request: web::Json<BankQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .question_service
        .create(&auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(question))
}

#[put("/api/admin/questions/{id}")]
pub async fn update_bank_question(
    state: web::Data<Arc<AppState>>,
    question_id: web::Path<String>,
    request: web::Json<BankQuestionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .question_service
        .update(&auth.0, &question_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(question))
}

#[delete("/api/admin/questions/{id}")]
pub async fn delete_bank_question(
    state: web::Data<Arc<AppState>>,
    question_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.question_service.delete(&auth.0, &question_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Question deleted")))
}
