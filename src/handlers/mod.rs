pub mod admin_handler;
pub mod auth_handler;
pub mod group_handler;
pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

use crate::errors::AppError;

/// Registers every route. Literal paths come before `{id}` paths that could shadow them.
///
/// Malformed bodies and query strings are reported as `AppError::ValidationError`, so
/// they carry the same JSON error body as every other failure.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into()),
    );

    cfg.service(health_handler::health_check)
        .service(health_handler::health_check_live)
        .service(health_handler::health_check_ready)
        .service(auth_handler::register)
        .service(auth_handler::login)
        .service(auth_handler::refresh_token)
        .service(auth_handler::logout)
        .service(auth_handler::me)
        .service(quiz_handler::list_quizzes)
        .service(quiz_handler::redeem_code)
        .service(quiz_handler::my_attempts)
        .service(quiz_handler::attempt_review)
        .service(quiz_handler::get_quiz)
        .service(quiz_handler::submit_attempt)
        .service(quiz_handler::leaderboard)
        .service(group_handler::list_groups)
        .service(group_handler::create_group)
        .service(group_handler::join_group)
        .service(group_handler::get_group)
        .service(group_handler::delete_group)
        .service(group_handler::leave_group)
        .service(group_handler::remove_group_member)
        .service(admin_handler::list_managed_quizzes)
        .service(admin_handler::create_quiz)
        .service(admin_handler::get_managed_quiz)
        .service(admin_handler::update_quiz)
        .service(admin_handler::toggle_quiz)
        .service(admin_handler::delete_quiz)
        .service(admin_handler::add_questions_from_bank)
        .service(admin_handler::list_attempts)
        .service(admin_handler::stats)
        .service(admin_handler::list_bank_questions)
        .service(admin_handler::create_bank_question)
        .service(admin_handler::update_bank_question)
        .service(admin_handler::delete_bank_question);
}
