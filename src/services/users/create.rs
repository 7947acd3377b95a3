use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{UserService, user_error_response};
use crate::errors::AcademyError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserRole, requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::batches::lock::lock_batch;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_name, validate_password_simple};

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(e) = authorize(&actor, Action::ManageUsers, None) {
        return Ok(user_error_response(&e));
    }

    user_data.name = user_data.name.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();

    if let Err(msg) = validate_name(&user_data.name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
    }

    if let Err(msg) = validate_email(&user_data.email) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }

    if let Err(msg) = validate_password_simple(&user_data.password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    if user_data.batch_id.is_some() && user_data.role != UserRole::Learner {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BatchStudentsInvalid,
            "Only learners can be assigned to a batch",
        )));
    }

    let storage = service.get_storage(request)?;

    match storage.get_user_by_email(&user_data.email).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Email already exists",
            )));
        }
        Ok(None) => {}
        Err(e) => return Ok(user_error_response(&e)),
    }

    user_data.password = match hash_password(&user_data.password) {
        Ok(hash) => hash,
        Err(e) => return Ok(user_error_response(&e)),
    };

    // 带批次创建会修改批次成员，需与其他成员调整串行
    let _guard = match user_data.batch_id {
        Some(batch_id) => Some(lock_batch(batch_id).await),
        None => None,
    };

    match storage.create_user(user_data).await {
        Ok(user) => {
            info!("User {} created with role {} by {}", user.id, user.role, actor.id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "User created successfully")))
        }
        Err(AcademyError::DatabaseOperation(msg)) if is_unique_violation(&msg) => {
            Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Email already exists",
            )))
        }
        Err(e) => {
            error!("User creation failed: {}", e);
            Ok(user_error_response(&e))
        }
    }
}

// 并发注册同一邮箱时由唯一索引拦截
pub(super) fn is_unique_violation(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("unique") || msg.contains("duplicate")
}
