use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{BatchService, batch_error_response};
use crate::models::{ApiResponse, batches::responses::BatchListResponse};

pub async fn list_batches(
    service: &BatchService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_batch_details().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            BatchListResponse { items },
            "Batch list retrieved successfully",
        ))),
        Err(e) => Ok(batch_error_response(&e)),
    }
}
