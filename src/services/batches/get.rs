use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{BatchService, batch_error_response};
use crate::models::{ApiResponse, ErrorCode, batches::responses::BatchResponse};

pub async fn get_batch(
    service: &BatchService,
    batch_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_batch_detail(batch_id).await {
        Ok(Some(batch)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            BatchResponse { batch },
            "Batch retrieved successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(batch_error_response(&e)),
    }
}

/// 写操作完成后返回最新的批次投影
pub(crate) async fn respond_with_detail(
    service: &BatchService,
    batch_id: i64,
    request: &HttpRequest,
    created: bool,
    message: &str,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_batch_detail(batch_id).await {
        Ok(Some(batch)) => {
            let body = ApiResponse::success(BatchResponse { batch }, message);
            if created {
                Ok(HttpResponse::Created().json(body))
            } else {
                Ok(HttpResponse::Ok().json(body))
            }
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::BatchNotFound,
            "Batch not found",
        ))),
        Err(e) => Ok(batch_error_response(&e)),
    }
}
