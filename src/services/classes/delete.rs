use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ClassService, class_error_response, class_not_found};
use crate::models::ApiResponse;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};

pub async fn delete_class(
    service: &ClassService,
    class_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let existing = match storage.get_class_by_id(class_id).await {
        Ok(Some(class)) => class,
        Ok(None) => return Ok(class_not_found()),
        Err(e) => return Ok(class_error_response(&e)),
    };

    if let Err(e) = authorize(&actor, Action::ManageClass, Some(existing.trainer_id)) {
        return Ok(class_error_response(&e));
    }

    match storage.delete_class(class_id).await {
        Ok(true) => {
            info!("Class {} deleted by {}", class_id, actor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Class deleted successfully")))
        }
        Ok(false) => Ok(class_not_found()),
        Err(e) => Ok(class_error_response(&e)),
    }
}
