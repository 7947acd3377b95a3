pub mod assign_batch;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::AcademyError;
use crate::models::users::requests::{
    AssignBatchRequest, CreateUserRequest, UpdateUserRequest, UserListParams,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 获取用户列表
    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, query, request).await
    }

    // 讲师列表
    pub async fn list_trainers(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_trainers(self, request).await
    }

    // 学员列表
    pub async fn list_learners(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_learners(self, request).await
    }

    // 创建用户
    pub async fn create_user(
        &self,
        user_data: CreateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(self, user_data, request).await
    }

    // 根据ID获取用户
    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_user(self, user_id, request).await
    }

    // 更新用户信息
    pub async fn update_user(
        &self,
        user_id: i64,
        update_data: UpdateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_user(self, user_id, update_data, request).await
    }

    // 删除用户
    pub async fn delete_user(
        &self,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_user(self, user_id, request).await
    }

    // 将学员分配到批次
    pub async fn assign_batch(
        &self,
        user_id: i64,
        assign: AssignBatchRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        assign_batch::assign_batch(self, user_id, assign, request).await
    }
}

// 用户相关操作的错误响应，批次相关错误使用批次业务码
pub(crate) fn user_error_response(err: &AcademyError) -> HttpResponse {
    let code = match err {
        AcademyError::NotFound(msg) if msg.starts_with("Batch") => ErrorCode::BatchNotFound,
        AcademyError::NotFound(_) => ErrorCode::UserNotFound,
        AcademyError::Validation(msg) if msg.starts_with("Students") => {
            ErrorCode::BatchStudentsInvalid
        }
        AcademyError::Conflict(_) => ErrorCode::BatchVersionConflict,
        _ => return ApiResponse::from_error(err, None),
    };
    ApiResponse::from_error(err, Some(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_user_error_codes() {
        let resp = user_error_response(&AcademyError::not_found("Batch not found: 3"));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = user_error_response(&AcademyError::validation(
            "Students must be existing learners, invalid IDs: [4]",
        ));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = user_error_response(&AcademyError::database_operation("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
