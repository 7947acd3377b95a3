use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::lock::lock_batch;
use super::{BatchService, batch_error_response};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::policy::{Action, authorize};

/// 删除批次，学员的批次引用随之清空；课程保留
pub async fn delete_batch(
    service: &BatchService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(e) = authorize(&actor, Action::ManageBatches, None) {
        return Ok(batch_error_response(&e));
    }

    let storage = service.get_storage(request)?;

    let result = {
        let _guard = lock_batch(batch_id).await;
        storage.delete_batch(batch_id).await
    };

    match result {
        Ok(true) => {
            info!("Batch {} deleted by {}", batch_id, actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Batch deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(batch_error_response(&e)),
    }
}
