use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, class_error_response, class_not_found};
use crate::models::{ApiResponse, classes::responses::ClassResponse};

pub async fn get_class(
    service: &ClassService,
    class_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    respond_with_detail(service, class_id, request, false, "Class retrieved successfully").await
}

/// 返回课程详情（含批次与讲师摘要）
pub(crate) async fn respond_with_detail(
    service: &ClassService,
    class_id: i64,
    request: &HttpRequest,
    created: bool,
    message: &str,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_class_detail(class_id).await {
        Ok(Some(class)) => {
            let body = ApiResponse::success(ClassResponse { class }, message);
            if created {
                Ok(HttpResponse::Created().json(body))
            } else {
                Ok(HttpResponse::Ok().json(body))
            }
        }
        Ok(None) => Ok(class_not_found()),
        Err(e) => Ok(class_error_response(&e)),
    }
}
