use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::batches::requests::{CreateBatchRequest, StudentIdsRequest, UpdateBatchRequest};
use crate::models::users::entities::UserRole;
use crate::services::BatchService;
use crate::utils::SafeIDI64;

// 懒加载的全局 BatchService 实例
static BATCH_SERVICE: Lazy<BatchService> = Lazy::new(BatchService::new_lazy);

pub async fn list_batches(req: HttpRequest) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.list_batches(&req).await
}

pub async fn get_batch(req: HttpRequest, batch_id: SafeIDI64) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.get_batch(batch_id.0, &req).await
}

pub async fn create_batch(
    req: HttpRequest,
    batch_data: web::Json<CreateBatchRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.create_batch(batch_data.into_inner(), &req).await
}

pub async fn update_batch(
    req: HttpRequest,
    batch_id: SafeIDI64,
    update_data: web::Json<UpdateBatchRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .update_batch(batch_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn delete_batch(req: HttpRequest, batch_id: SafeIDI64) -> ActixResult<HttpResponse> {
    BATCH_SERVICE.delete_batch(batch_id.0, &req).await
}

pub async fn add_students(
    req: HttpRequest,
    batch_id: SafeIDI64,
    body: web::Json<StudentIdsRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .add_students(batch_id.0, body.into_inner(), &req)
        .await
}

pub async fn sync_students(
    req: HttpRequest,
    batch_id: SafeIDI64,
    body: web::Json<StudentIdsRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .sync_students(batch_id.0, body.into_inner(), &req)
        .await
}

pub async fn remove_students(
    req: HttpRequest,
    batch_id: SafeIDI64,
    body: web::Json<StudentIdsRequest>,
) -> ActixResult<HttpResponse> {
    BATCH_SERVICE
        .remove_students(batch_id.0, body.into_inner(), &req)
        .await
}

// 配置路由
//
// 批次的增删改由服务层校验管理员身份，学员调整接口额外在路由层拦截
pub fn configure_batch_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/batches")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_batches))
                    .route(web::post().to(create_batch)),
            )
            .service(
                web::resource("/{id}/add-students")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::put().to(add_students)),
            )
            .service(
                web::resource("/{id}/sync-students")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::put().to(sync_students)),
            )
            .service(
                web::resource("/{id}/remove-students")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .route(web::put().to(remove_students)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_batch))
                    .route(web::put().to(update_batch))
                    .route(web::delete().to(delete_batch)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ObjectCache;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::models::ErrorCode;
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::jwt::JwtUtils;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use chrono::NaiveDate;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Fixture {
        storage: Arc<dyn Storage>,
        cache: Arc<dyn ObjectCache>,
        admin_token: String,
        trainer_token: String,
        batch_id: i64,
        learners: Vec<i64>,
    }

    async fn create(storage: &Arc<dyn Storage>, name: &str, role: UserRole) -> i64 {
        storage
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: format!("{name}@academy.test"),
                password: "hashed".to_string(),
                role,
                phone: None,
                subject: Some("Rust".to_string()),
                profile_image: None,
                batch_id: None,
            })
            .await
            .expect("create user")
            .id
    }

    async fn fixture() -> Fixture {
        let storage: Arc<dyn Storage> = Arc::new(
            SeaOrmStorage::connect("sqlite::memory:", 1, 5)
                .await
                .expect("in-memory database"),
        );
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));

        let admin = create(&storage, "root", UserRole::Admin).await;
        let trainer = create(&storage, "trent", UserRole::Trainer).await;
        let mut learners = Vec::new();
        for name in ["amy", "cole", "dina"] {
            learners.push(create(&storage, name, UserRole::Learner).await);
        }

        let batch_id = storage
            .create_batch(CreateBatchRequest {
                name: "Rust Cohort".to_string(),
                subject: "Rust".to_string(),
                trainer_id: Some(trainer),
                start_date: NaiveDate::from_ymd_opt(2025, 1, 6).expect("date"),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 28).expect("date"),
            })
            .await
            .expect("create batch")
            .id;

        Fixture {
            admin_token: JwtUtils::generate_access_token(admin, UserRole::ADMIN).expect("token"),
            trainer_token: JwtUtils::generate_access_token(trainer, UserRole::TRAINER)
                .expect("token"),
            storage,
            cache,
            batch_id,
            learners,
        }
    }

    async fn put_sync(
        fx: &Fixture,
        batch_id: i64,
        token: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.cache.clone()))
                .configure(configure_batch_routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/batches/{batch_id}/sync-students"))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_sync_returns_populated_projection() {
        let fx = fixture().await;
        let (a, c, d) = (fx.learners[0], fx.learners[1], fx.learners[2]);

        let (status, _) =
            put_sync(&fx, fx.batch_id, &fx.admin_token, json!({ "studentIds": [a, c] })).await;
        assert_eq!(status, StatusCode::OK);

        // 数字字符串与重复 ID 同样接受
        let (status, body) = put_sync(
            &fx,
            fx.batch_id,
            &fx.admin_token,
            json!({ "studentIds": [c, d.to_string(), c] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], 0);

        let batch = &body["data"]["batch"];
        assert_eq!(batch["trainer"]["name"], "trent");
        assert_eq!(batch["trainer"]["subject"], "Rust");
        let students: Vec<i64> = batch["students"]
            .as_array()
            .expect("students array")
            .iter()
            .map(|s| s["id"].as_i64().expect("id"))
            .collect();
        assert_eq!(students, vec![c, d]);
        assert_eq!(batch["students"][0]["email"], "cole@academy.test");

        let removed = fx.storage.get_user_by_id(a).await.expect("query").expect("user");
        assert_eq!(removed.batch_id, None);
        let added = fx.storage.get_user_by_id(d).await.expect("query").expect("user");
        assert_eq!(added.batch_id, Some(fx.batch_id));
    }

    #[actix_web::test]
    async fn test_sync_rejects_non_list_body() {
        let fx = fixture().await;
        let (status, body) =
            put_sync(&fx, fx.batch_id, &fx.admin_token, json!({ "studentIds": "1,2" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], ErrorCode::BatchStudentsInvalid as i32);

        let (status, _) = put_sync(
            &fx,
            fx.batch_id,
            &fx.admin_token,
            json!({ "studentIds": [fx.learners[0], "abc"] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let batch = fx
            .storage
            .get_batch_by_id(fx.batch_id)
            .await
            .expect("query")
            .expect("batch");
        assert!(batch.student_ids.is_empty());
    }

    #[actix_web::test]
    async fn test_sync_missing_batch_is_not_found() {
        let fx = fixture().await;
        let (status, body) =
            put_sync(&fx, 9_999, &fx.admin_token, json!({ "studentIds": [fx.learners[0]] })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], ErrorCode::BatchNotFound as i32);
    }

    #[actix_web::test]
    async fn test_sync_with_stale_version_conflicts() {
        let fx = fixture().await;
        let version = fx
            .storage
            .get_batch_by_id(fx.batch_id)
            .await
            .expect("query")
            .expect("batch")
            .version;

        let (status, body) = put_sync(
            &fx,
            fx.batch_id,
            &fx.admin_token,
            json!({ "studentIds": [fx.learners[0]], "version": version + 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], ErrorCode::BatchVersionConflict as i32);

        let (status, body) = put_sync(
            &fx,
            fx.batch_id,
            &fx.admin_token,
            json!({ "studentIds": [fx.learners[0]], "version": version }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["batch"]["version"], version + 1);
    }

    #[actix_web::test]
    async fn test_sync_requires_admin() {
        let fx = fixture().await;
        let (status, body) = put_sync(
            &fx,
            fx.batch_id,
            &fx.trainer_token,
            json!({ "studentIds": [fx.learners[0]] }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], ErrorCode::Forbidden as i32);

        let (status, _) =
            put_sync(&fx, fx.batch_id, "not-a-token", json!({ "studentIds": [] })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
