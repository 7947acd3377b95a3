use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::recordings::requests::UpdateRecordingRequest;
use crate::models::users::entities::UserRole;
use crate::services::RecordingService;
use crate::utils::SafeClassIdI64;

// 懒加载的全局 RecordingService 实例
static RECORDING_SERVICE: Lazy<RecordingService> = Lazy::new(RecordingService::new_lazy);

pub async fn list_recordings(req: HttpRequest) -> ActixResult<HttpResponse> {
    RECORDING_SERVICE.list_recordings(&req).await
}

pub async fn upload_recording(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    body: web::Json<UpdateRecordingRequest>,
) -> ActixResult<HttpResponse> {
    RECORDING_SERVICE
        .upload_recording(class_id.0, body.into_inner(), &req)
        .await
}

pub async fn delete_recording(
    req: HttpRequest,
    class_id: SafeClassIdI64,
) -> ActixResult<HttpResponse> {
    RECORDING_SERVICE.delete_recording(class_id.0, &req).await
}

// 配置路由
pub fn configure_recording_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/recordings")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_recordings))
            .service(
                web::resource("/{class_id}")
                    .wrap(middlewares::RequireRole::new_any(UserRole::trainer_roles()))
                    .route(web::put().to(upload_recording))
                    .route(web::delete().to(delete_recording)),
            ),
    );
}
