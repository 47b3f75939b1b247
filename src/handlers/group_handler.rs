use std::sync::Arc;

use actix_web::{delete, get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::{CreateGroupRequest, JoinGroupRequest, ScopeQuery},
        response::MessageResponse,
    },
};

#[get("/api/groups")]
pub async fn list_groups(
    state: web::Data<Arc<AppState>>,
    query: web::Query<ScopeQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let groups = state
        .group_service
        .list(&auth.0, query.scope.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(groups))
}

#[post("/api/groups")]
pub async fn create_group(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateGroupRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let group = state
        .group_service
        .create(&auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(group))
}

#[post("/api/groups/join")]
pub async fn join_group(
    state: web::Data<Arc<AppState>>,
    request: web::Json<JoinGroupRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let group = state
        .group_service
        .join(&auth.0, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(group))
}

#[get("/api/groups/{id}")]
pub async fn get_group(
    state: web::Data<Arc<AppState>>,
    group_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let group = state.group_service.get(&auth.0, &group_id).await?;
    Ok(HttpResponse::Ok().json(group))
}

#[delete("/api/groups/{id}")]
pub async fn delete_group(
    state: web::Data<Arc<AppState>>,
    group_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.group_service.delete(&auth.0, &group_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Group deleted")))
}

#[post("/api/groups/{id}/leave")]
pub async fn leave_group(
    state: web::Data<Arc<AppState>>,
    group_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    state.group_service.leave(&auth.0, &group_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Left group")))
}

#[delete("/api/groups/{id}/members/{member_id}")]
pub async fn remove_group_member(
    state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (group_id, member_id) = path.into_inner();
    state
        .group_service
        .remove_member(&auth.0, &group_id, &member_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Member removed")))
}
