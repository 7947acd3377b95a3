use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::create::{ensure_date_order, ensure_trainer};
use super::get::respond_with_detail;
use super::lock::lock_batch;
use super::{BatchService, batch_error_response};
use crate::models::batches::membership::parse_student_ids;
use crate::models::batches::requests::{BatchChanges, UpdateBatchRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::utils::validate::validate_name;

pub async fn update_batch(
    service: &BatchService,
    batch_id: i64,
    update_data: UpdateBatchRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(e) = authorize(&actor, Action::ManageBatches, None) {
        return Ok(batch_error_response(&e));
    }

    let mut changes = BatchChanges {
        trainer_id: update_data.trainer_id,
        start_date: update_data.start_date,
        end_date: update_data.end_date,
        ..Default::default()
    };

    if let Some(name) = update_data.name {
        let name = name.trim().to_string();
        if let Err(msg) = validate_name(&name) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BatchInvalid, msg)));
        }
        changes.name = Some(name);
    }

    if let Some(subject) = update_data.subject {
        let subject = subject.trim().to_string();
        if subject.is_empty() {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BatchInvalid,
                "Subject must not be empty",
            )));
        }
        changes.subject = Some(subject);
    }

    // 学员列表先整体校验格式，任何一个非法都拒绝整个请求
    let students = match update_data.students.as_ref().map(parse_student_ids) {
        Some(Ok(ids)) => Some(ids),
        Some(Err(e)) => return Ok(batch_error_response(&e)),
        None => None,
    };

    let storage = service.get_storage(request)?;

    if let Some(Some(trainer_id)) = changes.trainer_id
        && let Err(e) = ensure_trainer(&storage, trainer_id).await
    {
        return Ok(batch_error_response(&e));
    }

    let _guard = lock_batch(batch_id).await;

    let existing = match storage.get_batch_by_id(batch_id).await {
        Ok(Some(batch)) => batch,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::BatchNotFound,
                "Batch not found",
            )));
        }
        Err(e) => return Ok(batch_error_response(&e)),
    };

    // 只改一端日期时与库中另一端比较
    let start = changes.start_date.unwrap_or(existing.start_date);
    let end = changes.end_date.unwrap_or(existing.end_date);
    if let Err(e) = ensure_date_order(start, end) {
        return Ok(batch_error_response(&e));
    }

    match storage
        .update_batch(batch_id, changes, students, update_data.version)
        .await
    {
        Ok(Some(batch)) => {
            info!("Batch {} updated (version {})", batch.id, batch.version);
            respond_with_detail(service, batch_id, request, false, "Batch updated successfully")
                .await
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(batch_error_response(&e)),
    }
}
