use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::RecordingService;
use crate::models::{
    ApiResponse,
    classes::{requests::ClassListQuery, responses::ClassListResponse},
    users::entities::UserRole,
};
use crate::services::classes::class_error_response;
use crate::services::current_user;

/// 有录像的课程，最新的在前
pub async fn list_recordings(
    service: &RecordingService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let mut query = ClassListQuery {
        with_recording: true,
        newest_first: true,
        ..Default::default()
    };

    match actor.role {
        UserRole::Admin => {}
        UserRole::Trainer => query.trainer_id = Some(actor.id),
        UserRole::Learner => match storage.list_batch_ids_for_student(actor.id).await {
            Ok(batch_ids) => query.batch_ids = Some(batch_ids),
            Err(e) => return Ok(class_error_response(&e)),
        },
    }

    match storage.list_class_details(query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassListResponse { items },
            "Recordings retrieved successfully",
        ))),
        Err(e) => Ok(class_error_response(&e)),
    }
}
