use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, user_error_response};
use crate::models::{
    ApiResponse,
    users::{
        entities::UserRole,
        requests::{UserListParams, UserListQuery},
        responses::UserListResponse,
    },
};

pub async fn list_users(
    service: &UserService,
    query: UserListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let (page, size) = query.pagination.normalized();

    let list_query = UserListQuery {
        page,
        size,
        role: query.role,
        search: query.search,
    };

    match storage.list_users_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "User list retrieved successfully",
        ))),
        Err(e) => Ok(user_error_response(&e)),
    }
}

pub async fn list_trainers(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    list_by_role(service, UserRole::Trainer, request).await
}

pub async fn list_learners(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    list_by_role(service, UserRole::Learner, request).await
}

async fn list_by_role(
    service: &UserService,
    role: UserRole,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_users_by_role(role).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserListResponse { items },
            format!("{role} list retrieved successfully"),
        ))),
        Err(e) => Ok(user_error_response(&e)),
    }
}
