use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::create::is_unique_violation;
use super::{UserService, user_error_response};
use crate::errors::AcademyError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        requests::{UpdateUserRequest, UserChanges},
        responses::UserResponse,
    },
};
use crate::services::batches::lock::lock_batch;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_name, validate_password_simple};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 本人或管理员
    if let Err(e) = authorize(&actor, Action::UpdateProfile, Some(user_id)) {
        return Ok(user_error_response(&e));
    }

    // 批次只能由管理员调整
    if update_data.batch_id.is_some()
        && let Err(e) = authorize(&actor, Action::ManageUsers, None)
    {
        return Ok(user_error_response(&e));
    }

    let storage = service.get_storage(request)?;

    let target = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => return Ok(user_error_response(&e)),
    };

    let mut changes = UserChanges {
        phone: update_data.phone,
        subject: update_data.subject,
        profile_image: update_data.profile_image,
        ..Default::default()
    };

    if let Some(name) = update_data.name {
        let name = name.trim().to_string();
        if let Err(msg) = validate_name(&name) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
        }
        changes.name = Some(name);
    }

    if let Some(email) = update_data.email {
        let email = email.trim().to_lowercase();
        if let Err(msg) = validate_email(&email) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
        }
        match storage.get_user_by_email(&email).await {
            Ok(Some(existing)) if existing.id != user_id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::UserAlreadyExists,
                    "Email already exists",
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(user_error_response(&e)),
        }
        changes.email = Some(email);
    }

    if let Some(password) = update_data.password {
        if let Err(msg) = validate_password_simple(&password) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
        }
        changes.password_hash = match hash_password(&password) {
            Ok(hash) => Some(hash),
            Err(e) => return Ok(user_error_response(&e)),
        };
    }

    // 迁入批次与字段更新在同一事务内完成
    let moving_to = update_data
        .batch_id
        .filter(|batch_id| target.batch_id != Some(*batch_id));
    if moving_to.is_some() && !target.is_learner() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BatchStudentsInvalid,
            "Only learners can be assigned to a batch",
        )));
    }
    changes.batch_id = moving_to;

    let _guard = match moving_to {
        Some(batch_id) => Some(lock_batch(batch_id).await),
        None => None,
    };

    let result = storage.update_user(user_id, changes).await;
    if let (Some(batch_id), Ok(Some(_))) = (moving_to, &result) {
        info!("User {} moved to batch {}", user_id, batch_id);
    }

    match result {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "User updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(AcademyError::DatabaseOperation(msg)) if is_unique_violation(&msg) => {
            Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Email already exists",
            )))
        }
        Err(e) => Ok(user_error_response(&e)),
    }
}
