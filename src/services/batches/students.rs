//! 批次学员的追加 / 同步 / 移除

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::get::respond_with_detail;
use super::lock::lock_batch;
use super::{BatchService, batch_error_response};
use crate::models::batches::membership::{MembershipMode, parse_student_ids};
use crate::models::batches::requests::StudentIdsRequest;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};

pub async fn change_students(
    service: &BatchService,
    batch_id: i64,
    mode: MembershipMode,
    body: StudentIdsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(e) = authorize(&actor, Action::ManageBatches, None) {
        return Ok(batch_error_response(&e));
    }

    let student_ids = match parse_student_ids(&body.student_ids) {
        Ok(ids) => ids,
        Err(e) => return Ok(batch_error_response(&e)),
    };

    let storage = service.get_storage(request)?;

    let batch = {
        let _guard = lock_batch(batch_id).await;
        match storage
            .reconcile_batch_students(batch_id, mode, student_ids, body.version)
            .await
        {
            Ok(batch) => batch,
            Err(e) => return Ok(batch_error_response(&e)),
        }
    };

    info!(
        "Batch {} students {} by {}: {} member(s), version {}",
        batch_id,
        mode,
        actor.id,
        batch.student_ids.len(),
        batch.version
    );

    let message = match mode {
        MembershipMode::Sync => "Students synced successfully",
        MembershipMode::Append => "Students added successfully",
        MembershipMode::Remove => "Students removed successfully",
    };
    respond_with_detail(service, batch_id, request, false, message).await
}
