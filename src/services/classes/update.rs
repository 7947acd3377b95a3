use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::get::respond_with_detail;
use super::{ClassService, class_error_response, class_not_found};
use crate::errors::{AcademyError, Result};
use crate::models::{
    ApiResponse, ErrorCode,
    classes::{
        entities::Class,
        requests::{ClassChanges, UpdateClassRequest},
    },
};
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::utils::validate::{validate_http_link, validate_name, validate_time_range};

pub async fn update_class(
    service: &ClassService,
    class_id: i64,
    update_data: UpdateClassRequest,
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

    let changes = match build_changes(&existing, update_data) {
        Ok(changes) => changes,
        Err(e) => return Ok(class_error_response(&e)),
    };

    if let Some(batch_id) = changes.batch_id {
        match storage.get_batch_by_id(batch_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::BatchNotFound,
                    "Batch not found",
                )));
            }
            Err(e) => return Ok(class_error_response(&e)),
        }
    }

    match storage.update_class(class_id, changes).await {
        Ok(Some(_)) => {
            info!("Class {} updated by {}", class_id, actor.id);
            respond_with_detail(service, class_id, request, false, "Class updated successfully")
                .await
        }
        Ok(None) => Ok(class_not_found()),
        Err(e) => Ok(class_error_response(&e)),
    }
}

// 校验并整理字段变更；时间段按更新后的值整体校验
fn build_changes(existing: &Class, req: UpdateClassRequest) -> Result<ClassChanges> {
    let mut changes = ClassChanges {
        batch_id: req.batch_id,
        date: req.date,
        status: req.status,
        description: req.description.map(|d| d.trim().to_string()),
        ..Default::default()
    };

    if let Some(name) = req.class_name {
        let name = name.trim().to_string();
        validate_name(&name).map_err(AcademyError::validation)?;
        changes.class_name = Some(name);
    }

    if req.start_time.is_some() || req.end_time.is_some() {
        let start = req.start_time.unwrap_or_else(|| existing.start_time.clone());
        let end = req.end_time.unwrap_or_else(|| existing.end_time.clone());
        validate_time_range(&start, &end).map_err(AcademyError::validation)?;
        changes.start_time = Some(start);
        changes.end_time = Some(end);
    }

    if let Some(link) = req.teams_link {
        let link = link.trim().to_string();
        validate_http_link(&link).map_err(AcademyError::validation)?;
        changes.teams_link = Some(link);
    }

    // 空字符串表示清除录像
    if let Some(link) = req.recording_link {
        let link = link.trim().to_string();
        if !link.is_empty() {
            validate_http_link(&link).map_err(AcademyError::validation)?;
        }
        changes.recording_link = Some(link);
    }

    Ok(changes)
}
