use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ClassService, class_error_response};
use crate::models::{
    ApiResponse,
    classes::{
        requests::{ClassListQuery, ClassQueryParams},
        responses::ClassListResponse,
    },
    users::entities::UserRole,
};
use crate::services::current_user;

pub async fn list_classes(
    service: &ClassService,
    query: ClassQueryParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let list_query = ClassListQuery {
        batch_ids: query.batch.map(|batch_id| vec![batch_id]),
        trainer_id: query.trainer,
        date: query.date,
        ..Default::default()
    };

    match storage.list_class_details(list_query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassListResponse { items },
            "Class list retrieved successfully",
        ))),
        Err(e) => Ok(class_error_response(&e)),
    }
}

/// 讲师看自己的课，学员看所在批次的课，管理员看全部
pub async fn my_classes(service: &ClassService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let actor = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let mut list_query = ClassListQuery::default();
    match actor.role {
        UserRole::Admin => {}
        UserRole::Trainer => list_query.trainer_id = Some(actor.id),
        UserRole::Learner => {
            // 以成员表为准，缓存里的用户可能已被移出批次
            match storage.list_batch_ids_for_student(actor.id).await {
                Ok(batch_ids) => list_query.batch_ids = Some(batch_ids),
                Err(e) => return Ok(class_error_response(&e)),
            }
        }
    }

    match storage.list_class_details(list_query).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassListResponse { items },
            "Class list retrieved successfully",
        ))),
        Err(e) => Ok(class_error_response(&e)),
    }
}
