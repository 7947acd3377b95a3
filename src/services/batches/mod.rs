pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod lock;
pub mod students;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::AcademyError;
use crate::models::batches::membership::MembershipMode;
use crate::models::batches::requests::{CreateBatchRequest, StudentIdsRequest, UpdateBatchRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct BatchService {
    storage: Option<Arc<dyn Storage>>,
}

impl BatchService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    pub async fn list_batches(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_batches(self, request).await
    }

    pub async fn get_batch(&self, batch_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_batch(self, batch_id, request).await
    }

    pub async fn create_batch(
        &self,
        batch_data: CreateBatchRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_batch(self, batch_data, request).await
    }

    pub async fn update_batch(
        &self,
        batch_id: i64,
        update_data: UpdateBatchRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_batch(self, batch_id, update_data, request).await
    }

    pub async fn delete_batch(
        &self,
        batch_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_batch(self, batch_id, request).await
    }

    // 追加学员
    pub async fn add_students(
        &self,
        batch_id: i64,
        body: StudentIdsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        students::change_students(self, batch_id, MembershipMode::Append, body, request).await
    }

    // 按请求列表同步学员
    pub async fn sync_students(
        &self,
        batch_id: i64,
        body: StudentIdsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        students::change_students(self, batch_id, MembershipMode::Sync, body, request).await
    }

    // 移除学员
    pub async fn remove_students(
        &self,
        batch_id: i64,
        body: StudentIdsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        students::change_students(self, batch_id, MembershipMode::Remove, body, request).await
    }
}

// 批次相关错误映射到批次业务码
pub(crate) fn batch_error_response(err: &AcademyError) -> HttpResponse {
    let code = match err {
        AcademyError::NotFound(_) => ErrorCode::BatchNotFound,
        AcademyError::Validation(msg) if msg.to_ascii_lowercase().contains("student") => {
            ErrorCode::BatchStudentsInvalid
        }
        AcademyError::Validation(_) | AcademyError::DateParse(_) => ErrorCode::BatchInvalid,
        AcademyError::Conflict(_) => ErrorCode::BatchVersionConflict,
        AcademyError::Authorization(_) => ErrorCode::BatchPermissionDenied,
        _ => return ApiResponse::from_error(err, None),
    };
    ApiResponse::from_error(err, Some(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_batch_error_statuses() {
        assert_eq!(
            batch_error_response(&AcademyError::not_found("Batch not found: 1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            batch_error_response(&AcademyError::validation("studentIds must be an array"))
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            batch_error_response(&AcademyError::conflict("stale")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            batch_error_response(&AcademyError::authorization("nope")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            batch_error_response(&AcademyError::database_operation("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
