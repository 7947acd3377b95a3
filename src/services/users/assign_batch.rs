use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{UserService, user_error_response};
use crate::models::{
    ApiResponse, ErrorCode,
    batches::membership::MembershipMode,
    users::{requests::AssignBatchRequest, responses::UserResponse},
};
use crate::services::batches::lock::lock_batch;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};

/// 把单个学员追加到批次（已在其他批次时迁移过来）
pub async fn assign_batch(
    service: &UserService,
    user_id: i64,
    assign: AssignBatchRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = authorize(&actor, Action::ManageUsers, None) {
        return Ok(user_error_response(&e));
    }

    let storage = service.get_storage(request)?;

    {
        let _guard = lock_batch(assign.batch_id).await;
        if let Err(e) = storage
            .reconcile_batch_students(
                assign.batch_id,
                MembershipMode::Append,
                vec![user_id],
                None,
            )
            .await
        {
            return Ok(user_error_response(&e));
        }
    }
    info!("User {} assigned to batch {}", user_id, assign.batch_id);

    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "Batch assigned successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(user_error_response(&e)),
    }
}
