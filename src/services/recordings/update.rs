use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::RecordingService;
use crate::models::{
    ApiResponse, ErrorCode,
    classes::{entities::ClassStatus, requests::ClassChanges, responses::ClassResponse},
};
use crate::services::classes::{class_error_response, class_not_found};
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::utils::validate::validate_http_link;

/// `link` 为 `None` 时清除录像
pub async fn set_recording(
    service: &RecordingService,
    class_id: i64,
    link: Option<String>,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let changes = match link.map(|l| l.trim().to_string()) {
        Some(link) => {
            if let Err(msg) = validate_http_link(&link) {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::RecordingInvalid, msg)));
            }
            ClassChanges {
                recording_link: Some(link),
                status: Some(ClassStatus::Completed),
                ..Default::default()
            }
        }
        None => ClassChanges {
            recording_link: Some(String::new()),
            ..Default::default()
        },
    };

    let storage = service.get_storage(request)?;

    let existing = match storage.get_class_by_id(class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => return Ok(class_not_found()),
        Err(e) => return Ok(class_error_response(&e)),
    };

    if let Err(e) = authorize(&actor, Action::ManageRecording, Some(existing.trainer_id)) {
        return Ok(class_error_response(&e));
    }

    let cleared = changes.status.is_none();
    if let Err(e) = storage.update_class(class_id, changes).await {
        return Ok(class_error_response(&e));
    }
    info!(
        "Recording of class {} {} by {}",
        class_id,
        if cleared { "cleared" } else { "set" },
        actor.id
    );

    match storage.get_class_detail(class_id).await {
        Ok(Some(class)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassResponse { class },
            if cleared {
                "Recording deleted successfully"
            } else {
                "Recording uploaded successfully"
            },
        ))),
        Ok(None) => Ok(class_not_found()),
        Err(e) => Ok(class_error_response(&e)),
    }
}
