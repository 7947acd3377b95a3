use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use super::get::respond_with_detail;
use super::{BatchService, batch_error_response};
use crate::errors::{AcademyError, Result};
use crate::models::batches::requests::CreateBatchRequest;
use crate::models::users::entities::UserRole;
use crate::services::current_user;
use crate::services::policy::{Action, authorize};
use crate::storage::Storage;
use crate::utils::validate::validate_name;

pub async fn create_batch(
    service: &BatchService,
    mut batch_data: CreateBatchRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if let Err(e) = authorize(&actor, Action::ManageBatches, None) {
        return Ok(batch_error_response(&e));
    }

    batch_data.name = batch_data.name.trim().to_string();
    batch_data.subject = batch_data.subject.trim().to_string();

    if let Err(e) = validate_batch_fields(&batch_data) {
        return Ok(batch_error_response(&e));
    }

    let storage = service.get_storage(request)?;

    if let Some(trainer_id) = batch_data.trainer_id
        && let Err(e) = ensure_trainer(&storage, trainer_id).await
    {
        return Ok(batch_error_response(&e));
    }

    match storage.create_batch(batch_data).await {
        Ok(batch) => {
            info!("Batch {} created by {}", batch.id, actor.id);
            respond_with_detail(service, batch.id, request, true, "Batch created successfully")
                .await
        }
        Err(e) => Ok(batch_error_response(&e)),
    }
}

fn validate_batch_fields(batch: &CreateBatchRequest) -> Result<()> {
    validate_name(&batch.name).map_err(AcademyError::validation)?;
    if batch.subject.is_empty() {
        return Err(AcademyError::validation("Subject must not be empty"));
    }
    ensure_date_order(batch.start_date, batch.end_date)
}

/// 结束日期不能早于开始日期
pub(crate) fn ensure_date_order(start: chrono::NaiveDate, end: chrono::NaiveDate) -> Result<()> {
    if end < start {
        return Err(AcademyError::validation(
            "End date must not be before start date",
        ));
    }
    Ok(())
}

/// 讲师必须是已存在且角色为 trainer 的用户
pub(crate) async fn ensure_trainer(storage: &Arc<dyn Storage>, trainer_id: i64) -> Result<()> {
    match storage.get_user_by_id(trainer_id).await? {
        Some(user) if user.role == UserRole::Trainer => Ok(()),
        _ => Err(AcademyError::validation(format!(
            "Trainer must be an existing trainer: {trainer_id}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(name: &str, subject: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> CreateBatchRequest {
        CreateBatchRequest {
            name: name.to_string(),
            subject: subject.to_string(),
            trainer_id: None,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).expect("date"),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).expect("date"),
        }
    }

    #[test]
    fn test_batch_field_validation() {
        assert!(validate_batch_fields(&request("B1", "Rust", (2025, 1, 6), (2025, 3, 28))).is_ok());
        // 单日批次
        assert!(validate_batch_fields(&request("B1", "Rust", (2025, 1, 6), (2025, 1, 6))).is_ok());
        assert!(validate_batch_fields(&request("", "Rust", (2025, 1, 6), (2025, 3, 28))).is_err());
        assert!(validate_batch_fields(&request("B1", "", (2025, 1, 6), (2025, 3, 28))).is_err());

        let err = validate_batch_fields(&request("B1", "Rust", (2025, 3, 28), (2025, 1, 6)))
            .unwrap_err();
        assert_eq!(err.message(), "End date must not be before start date");
    }
}
