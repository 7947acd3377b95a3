use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::get::respond_with_detail;
use super::{ClassService, class_error_response};
use crate::errors::{AcademyError, Result};
use crate::models::{
    ApiResponse, ErrorCode,
    classes::requests::{CreateClassRequest, NewClass},
    users::entities::UserRole,
};
use crate::services::batches::create::ensure_trainer;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::utils::validate::{validate_http_link, validate_name, validate_time_range};

pub async fn create_class(
    service: &ClassService,
    class_data: CreateClassRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 讲师只能给自己排课；管理员必须指定讲师
    let trainer_id = match (actor.role, class_data.trainer_id) {
        (UserRole::Learner, _) => {
            let err = AcademyError::authorization("Learners cannot create classes");
            return Ok(class_error_response(&err));
        }
        (UserRole::Trainer, _) => actor.id,
        (_, Some(trainer_id)) => trainer_id,
        (_, None) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ClassInvalid,
                "Trainer is required",
            )));
        }
    };

    if let Err(e) = authorize(&actor, Action::CreateClass, Some(trainer_id)) {
        return Ok(class_error_response(&e));
    }

    let new_class = match build_new_class(class_data, trainer_id) {
        Ok(new_class) => new_class,
        Err(e) => return Ok(class_error_response(&e)),
    };

    let storage = service.get_storage(request)?;

    if actor.role != UserRole::Trainer
        && let Err(e) = ensure_trainer(&storage, trainer_id).await
    {
        return Ok(class_error_response(&e));
    }

    match storage.get_batch_by_id(new_class.batch_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::BatchNotFound,
                "Batch not found",
            )));
        }
        Err(e) => return Ok(class_error_response(&e)),
    }

    match storage.create_class(new_class).await {
        Ok(class) => {
            info!(
                "Class {} scheduled for batch {} by {}",
                class.id, class.batch_id, actor.id
            );
            respond_with_detail(service, class.id, request, true, "Class created successfully")
                .await
        }
        Err(e) => Ok(class_error_response(&e)),
    }
}

fn build_new_class(req: CreateClassRequest, trainer_id: i64) -> Result<NewClass> {
    let class_name = req.class_name.trim().to_string();
    validate_name(&class_name).map_err(AcademyError::validation)?;
    validate_time_range(&req.start_time, &req.end_time).map_err(AcademyError::validation)?;
    let teams_link = req.teams_link.trim().to_string();
    validate_http_link(&teams_link).map_err(AcademyError::validation)?;

    Ok(NewClass {
        class_name,
        batch_id: req.batch_id,
        trainer_id,
        date: req.date,
        start_time: req.start_time,
        end_time: req.end_time,
        teams_link,
        description: req.description.unwrap_or_default().trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(start: &str, end: &str, link: &str) -> CreateClassRequest {
        CreateClassRequest {
            class_name: " Ownership & Borrowing ".to_string(),
            batch_id: 1,
            trainer_id: None,
            date: NaiveDate::from_ymd_opt(2025, 2, 3).expect("date"),
            start_time: start.to_string(),
            end_time: end.to_string(),
            teams_link: link.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_build_new_class() {
        let class = build_new_class(request("09:00", "10:30", "https://teams.example.com/m/1"), 7)
            .expect("valid class");
        assert_eq!(class.class_name, "Ownership & Borrowing");
        assert_eq!(class.trainer_id, 7);
        assert_eq!(class.description, "");
    }

    #[test]
    fn test_build_new_class_rejects_bad_input() {
        assert!(build_new_class(request("10:30", "09:00", "https://t.example.com"), 7).is_err());
        assert!(build_new_class(request("9am", "10:00", "https://t.example.com"), 7).is_err());
        assert!(build_new_class(request("09:00", "10:00", "teams-room-4"), 7).is_err());
    }
}
