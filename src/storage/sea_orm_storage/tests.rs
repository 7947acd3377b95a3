//! 存储层测试（内存 SQLite，已执行迁移）

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::SeaOrmStorage;
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::models::batches::{
    entities::Batch,
    membership::MembershipMode,
    requests::{BatchChanges, CreateBatchRequest},
};
use crate::models::classes::requests::{ClassChanges, ClassListQuery, NewClass};
use crate::models::users::{
    entities::UserRole,
    requests::{CreateUserRequest, UserChanges, UserListQuery},
};

async fn storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:", 1, 5)
        .await
        .expect("in-memory database")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

async fn user(storage: &SeaOrmStorage, name: &str, role: UserRole) -> i64 {
    user_in_batch(storage, name, role, None).await
}

async fn user_in_batch(
    storage: &SeaOrmStorage,
    name: &str,
    role: UserRole,
    batch_id: Option<i64>,
) -> i64 {
    storage
        .create_user_impl(CreateUserRequest {
            name: name.to_string(),
            email: format!("{name}@academy.test"),
            password: "hashed".to_string(),
            role,
            phone: None,
            subject: None,
            profile_image: None,
            batch_id,
        })
        .await
        .expect("create user")
        .id
}

async fn batch(storage: &SeaOrmStorage, name: &str) -> i64 {
    storage
        .create_batch_impl(CreateBatchRequest {
            name: name.to_string(),
            subject: "Rust".to_string(),
            trainer_id: None,
            start_date: date(2025, 1, 6),
            end_date: date(2025, 3, 28),
        })
        .await
        .expect("create batch")
        .id
}

async fn batch_of(storage: &SeaOrmStorage, user_id: i64) -> Option<i64> {
    storage
        .get_user_by_id_impl(user_id)
        .await
        .expect("query user")
        .expect("user exists")
        .batch_id
}

async fn load(storage: &SeaOrmStorage, batch_id: i64) -> Batch {
    storage
        .get_batch_by_id_impl(batch_id)
        .await
        .expect("query batch")
        .expect("batch exists")
}

async fn sync(storage: &SeaOrmStorage, batch_id: i64, ids: &[i64]) -> Batch {
    storage
        .reconcile_batch_students_impl(batch_id, MembershipMode::Sync, ids.to_vec(), None)
        .await
        .expect("sync students")
}

#[tokio::test]
async fn test_sync_replaces_members_and_back_references() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    let d = user(&storage, "dave", UserRole::Learner).await;

    sync(&storage, b, &[a, c]).await;
    assert_eq!(batch_of(&storage, a).await, Some(b));

    let result = sync(&storage, b, &[c, d]).await;
    assert_eq!(result.student_ids, vec![c, d]);
    assert_eq!(load(&storage, b).await.student_ids, vec![c, d]);
    assert_eq!(batch_of(&storage, a).await, None);
    assert_eq!(batch_of(&storage, c).await, Some(b));
    assert_eq!(batch_of(&storage, d).await, Some(b));
}

#[tokio::test]
async fn test_sync_dedupes_and_is_idempotent() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;

    let first = sync(&storage, b, &[c, a, c]).await;
    assert_eq!(first.student_ids, vec![c, a]);

    let second = sync(&storage, b, &[c, a, c]).await;
    assert_eq!(second.student_ids, first.student_ids);
    // 成员未变化时不递增版本
    assert_eq!(second.version, first.version);
    assert_eq!(batch_of(&storage, a).await, Some(b));
    assert_eq!(batch_of(&storage, c).await, Some(b));
}

#[tokio::test]
async fn test_sync_with_empty_list_clears_everyone() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    sync(&storage, b, &[a, c]).await;

    let result = sync(&storage, b, &[]).await;
    assert!(result.student_ids.is_empty());
    assert!(load(&storage, b).await.student_ids.is_empty());
    assert_eq!(batch_of(&storage, a).await, None);
    assert_eq!(batch_of(&storage, c).await, None);
}

#[tokio::test]
async fn test_invalid_ids_reject_whole_request() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    let t = user(&storage, "trent", UserRole::Trainer).await;
    let before = sync(&storage, b, &[a]).await;

    for bad in [vec![c, 9_999], vec![c, t]] {
        let err = storage
            .reconcile_batch_students_impl(b, MembershipMode::Sync, bad, None)
            .await
            .expect_err("must reject");
        assert_eq!(err.code(), "E006");
    }

    let after = load(&storage, b).await;
    assert_eq!(after.student_ids, vec![a]);
    assert_eq!(after.version, before.version);
    assert_eq!(batch_of(&storage, a).await, Some(b));
    assert_eq!(batch_of(&storage, c).await, None);
}

#[tokio::test]
async fn test_missing_batch_is_not_found_without_side_effects() {
    let storage = storage().await;
    let a = user(&storage, "alice", UserRole::Learner).await;

    let err = storage
        .reconcile_batch_students_impl(404, MembershipMode::Sync, vec![a], None)
        .await
        .expect_err("batch does not exist");
    assert_eq!(err.code(), "E007");
    assert_eq!(batch_of(&storage, a).await, None);
}

#[tokio::test]
async fn test_append_is_idempotent() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;

    let first = storage
        .reconcile_batch_students_impl(b, MembershipMode::Append, vec![a], None)
        .await
        .expect("append");
    let second = storage
        .reconcile_batch_students_impl(b, MembershipMode::Append, vec![c, a], None)
        .await
        .expect("append");
    assert_eq!(second.student_ids, vec![a, c]);
    assert_eq!(second.version, first.version + 1);

    let third = storage
        .reconcile_batch_students_impl(b, MembershipMode::Append, vec![a, c], None)
        .await
        .expect("append");
    assert_eq!(third.student_ids, vec![a, c]);
    assert_eq!(third.version, second.version);
}

#[tokio::test]
async fn test_remove_clears_only_own_back_reference() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let other = batch(&storage, "Other").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    sync(&storage, b, &[a, c]).await;

    // 模拟引用已指向其他批次的脏数据
    Users::update_many()
        .col_expr(UserColumn::BatchId, Expr::value(other))
        .filter(UserColumn::Id.eq(c))
        .exec(&storage.db)
        .await
        .expect("update user");

    let result = storage
        .reconcile_batch_students_impl(b, MembershipMode::Remove, vec![a, c, 777], None)
        .await
        .expect("remove");
    assert!(result.student_ids.is_empty());
    assert_eq!(batch_of(&storage, a).await, None);
    assert_eq!(batch_of(&storage, c).await, Some(other));
}

#[tokio::test]
async fn test_linking_moves_learner_out_of_previous_batch() {
    let storage = storage().await;
    let first = batch(&storage, "First").await;
    let second = batch(&storage, "Second").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    let before = sync(&storage, first, &[a, c]).await;

    storage
        .reconcile_batch_students_impl(second, MembershipMode::Append, vec![a], None)
        .await
        .expect("append");

    let first_after = load(&storage, first).await;
    assert_eq!(first_after.student_ids, vec![c]);
    assert_eq!(first_after.version, before.version + 1);
    assert_eq!(load(&storage, second).await.student_ids, vec![a]);
    assert_eq!(batch_of(&storage, a).await, Some(second));
    assert_eq!(
        storage
            .list_batch_ids_for_student_impl(a)
            .await
            .expect("query"),
        vec![second]
    );
}

#[tokio::test]
async fn test_stale_version_is_conflict() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    let current = sync(&storage, b, &[a]).await;

    let err = storage
        .reconcile_batch_students_impl(
            b,
            MembershipMode::Sync,
            vec![c],
            Some(current.version - 1),
        )
        .await
        .expect_err("stale version");
    assert_eq!(err.code(), "E008");
    assert_eq!(load(&storage, b).await.student_ids, vec![a]);

    let ok = storage
        .reconcile_batch_students_impl(b, MembershipMode::Sync, vec![c], Some(current.version))
        .await
        .expect("fresh version");
    assert_eq!(ok.student_ids, vec![c]);
}

#[tokio::test]
async fn test_create_learner_with_batch_joins_membership() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user_in_batch(&storage, "alice", UserRole::Learner, Some(b)).await;
    // 讲师不会加入批次成员
    let t = user_in_batch(&storage, "trent", UserRole::Trainer, Some(b)).await;

    assert_eq!(batch_of(&storage, a).await, Some(b));
    assert_eq!(batch_of(&storage, t).await, None);
    assert_eq!(load(&storage, b).await.student_ids, vec![a]);
}

#[tokio::test]
async fn test_create_learner_with_missing_batch_rolls_back() {
    let storage = storage().await;
    let err = storage
        .create_user_impl(CreateUserRequest {
            name: "ghost".to_string(),
            email: "ghost@academy.test".to_string(),
            password: "hashed".to_string(),
            role: UserRole::Learner,
            phone: None,
            subject: None,
            profile_image: None,
            batch_id: Some(12_345),
        })
        .await
        .expect_err("batch does not exist");
    assert_eq!(err.code(), "E007");
    assert!(
        storage
            .get_user_by_email_impl("ghost@academy.test")
            .await
            .expect("query")
            .is_none()
    );
}

#[tokio::test]
async fn test_update_batch_with_students_is_atomic() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let t = user(&storage, "trent", UserRole::Trainer).await;

    let changes = BatchChanges {
        name: Some("Renamed".to_string()),
        trainer_id: Some(Some(t)),
        ..Default::default()
    };
    let updated = storage
        .update_batch_impl(b, changes, Some(vec![a]), None)
        .await
        .expect("update")
        .expect("batch exists");
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.trainer_id, Some(t));
    assert_eq!(updated.student_ids, vec![a]);
    assert_eq!(batch_of(&storage, a).await, Some(b));

    // 学员列表不合法时字段修改也一起回滚
    let changes = BatchChanges {
        name: Some("Broken".to_string()),
        ..Default::default()
    };
    assert!(
        storage
            .update_batch_impl(b, changes, Some(vec![t]), None)
            .await
            .is_err()
    );
    let after = load(&storage, b).await;
    assert_eq!(after.name, "Renamed");
    assert_eq!(after.student_ids, vec![a]);

    assert!(
        storage
            .update_batch_impl(999, BatchChanges::default(), None, None)
            .await
            .expect("query")
            .is_none()
    );
}

#[tokio::test]
async fn test_batch_detail_populates_trainer_and_students() {
    let storage = storage().await;
    let t = user(&storage, "trent", UserRole::Trainer).await;
    let b = storage
        .create_batch_impl(CreateBatchRequest {
            name: "B".to_string(),
            subject: "Rust".to_string(),
            trainer_id: Some(t),
            start_date: date(2025, 1, 6),
            end_date: date(2025, 3, 28),
        })
        .await
        .expect("create batch")
        .id;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    sync(&storage, b, &[c, a]).await;

    let detail = storage
        .get_batch_detail_impl(b)
        .await
        .expect("query")
        .expect("exists");
    assert_eq!(detail.trainer.as_ref().map(|t| t.name.as_str()), Some("trent"));
    assert_eq!(detail.student_ids(), vec![c, a]);
    assert_eq!(detail.students[0].email, "carol@academy.test");
    assert_eq!(detail.start_date, date(2025, 1, 6));

    let all = storage.list_batch_details_impl().await.expect("list");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_delete_batch_detaches_learners_and_orphans_classes() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let t = user(&storage, "trent", UserRole::Trainer).await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    sync(&storage, b, &[a]).await;

    let class = storage
        .create_class_impl(NewClass {
            class_name: "Intro".to_string(),
            batch_id: b,
            trainer_id: t,
            date: date(2025, 1, 7),
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            teams_link: "https://teams.example.com/intro".to_string(),
            description: String::new(),
        })
        .await
        .expect("create class");

    assert!(storage.delete_batch_impl(b).await.expect("delete"));
    assert!(!storage.delete_batch_impl(b).await.expect("delete again"));
    assert_eq!(batch_of(&storage, a).await, None);
    assert!(
        storage
            .list_batch_ids_for_student_impl(a)
            .await
            .expect("query")
            .is_empty()
    );

    let detail = storage
        .get_class_detail_impl(class.id)
        .await
        .expect("query")
        .expect("class kept");
    assert!(detail.batch.is_none());
    assert_eq!(detail.trainer.map(|t| t.id), Some(t));
}

#[tokio::test]
async fn test_delete_user_removes_membership() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;
    let before = sync(&storage, b, &[a, c]).await;

    assert!(storage.delete_user_impl(a).await.expect("delete"));
    let after = load(&storage, b).await;
    assert_eq!(after.student_ids, vec![c]);
    assert_eq!(after.version, before.version + 1);
    assert!(storage.get_user_by_id_impl(a).await.expect("query").is_none());
}

#[tokio::test]
async fn test_class_listing_filters_and_order() {
    let storage = storage().await;
    let b1 = batch(&storage, "B1").await;
    let b2 = batch(&storage, "B2").await;
    let t = user(&storage, "trent", UserRole::Trainer).await;
    let u = user(&storage, "uma", UserRole::Trainer).await;

    let mut ids = Vec::new();
    for (batch_id, trainer_id, day, start) in [
        (b1, t, 8, "14:00"),
        (b1, t, 8, "09:00"),
        (b2, u, 7, "11:00"),
    ] {
        let class = storage
            .create_class_impl(NewClass {
                class_name: format!("class-{day}-{start}"),
                batch_id,
                trainer_id,
                date: date(2025, 1, day),
                start_time: start.to_string(),
                end_time: "18:00".to_string(),
                teams_link: "https://teams.example.com/x".to_string(),
                description: String::new(),
            })
            .await
            .expect("create class");
        ids.push(class.id);
    }

    let all = storage
        .list_class_details_impl(ClassListQuery::default())
        .await
        .expect("list");
    let order: Vec<i64> = all.iter().map(|c| c.id).collect();
    assert_eq!(order, vec![ids[2], ids[1], ids[0]]);

    let by_batch = storage
        .list_class_details_impl(ClassListQuery {
            batch_ids: Some(vec![b1]),
            date: Some(date(2025, 1, 8)),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(by_batch.len(), 2);
    assert_eq!(by_batch[0].start_time, "09:00");

    let by_trainer = storage
        .list_class_details_impl(ClassListQuery {
            trainer_id: Some(u),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(by_trainer.len(), 1);

    let none = storage
        .list_class_details_impl(ClassListQuery {
            batch_ids: Some(Vec::new()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_recordings_listing() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let t = user(&storage, "trent", UserRole::Trainer).await;

    let mut ids = Vec::new();
    for day in [3, 9, 5] {
        let class = storage
            .create_class_impl(NewClass {
                class_name: format!("day-{day}"),
                batch_id: b,
                trainer_id: t,
                date: date(2025, 2, day),
                start_time: "09:00".to_string(),
                end_time: "10:00".to_string(),
                teams_link: "https://teams.example.com/x".to_string(),
                description: String::new(),
            })
            .await
            .expect("create class");
        ids.push(class.id);
    }

    for &id in &ids[..2] {
        storage
            .update_class_impl(
                id,
                ClassChanges {
                    recording_link: Some("https://video.example.com/r".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("exists");
    }

    let recordings = storage
        .list_class_details_impl(ClassListQuery {
            with_recording: true,
            newest_first: true,
            ..Default::default()
        })
        .await
        .expect("list");
    let order: Vec<i64> = recordings.iter().map(|c| c.id).collect();
    assert_eq!(order, vec![ids[1], ids[0]]);
}

#[tokio::test]
async fn test_user_listing_search_and_role_filter() {
    let storage = storage().await;
    user(&storage, "alice", UserRole::Learner).await;
    user(&storage, "al_bert", UserRole::Trainer).await;
    user(&storage, "carol", UserRole::Learner).await;

    let page = storage
        .list_users_with_pagination_impl(UserListQuery {
            page: 1,
            size: 10,
            role: None,
            search: Some("al".to_string()),
        })
        .await
        .expect("list users");
    assert_eq!(page.pagination.total, 2);

    // 下划线按字面匹配
    let page = storage
        .list_users_with_pagination_impl(UserListQuery {
            page: 1,
            size: 10,
            role: None,
            search: Some("l_b".to_string()),
        })
        .await
        .expect("list users");
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "al_bert");

    let learners = storage
        .list_users_with_pagination_impl(UserListQuery {
            page: 1,
            size: 10,
            role: Some(UserRole::Learner),
            search: None,
        })
        .await
        .expect("list users");
    assert_eq!(learners.pagination.total, 2);
    assert!(learners.items.iter().all(|u| u.role == UserRole::Learner));
}

#[tokio::test]
async fn test_append_past_limit_is_rejected_on_every_path() {
    let storage = storage().await.with_max_batch_students(2);
    let b = batch(&storage, "B").await;
    let a = user_in_batch(&storage, "alice", UserRole::Learner, Some(b)).await;
    let c = user_in_batch(&storage, "carol", UserRole::Learner, Some(b)).await;
    let d = user(&storage, "dave", UserRole::Learner).await;

    // 追加单个学员
    let err = storage
        .reconcile_batch_students_impl(b, MembershipMode::Append, vec![d], None)
        .await
        .expect_err("batch is full");
    assert_eq!(err.code(), "E006");
    assert!(err.message().starts_with("Students exceed the batch limit of 2"));

    // 更新用户时迁入
    let err = storage
        .update_user_impl(
            d,
            UserChanges {
                batch_id: Some(b),
                ..Default::default()
            },
        )
        .await
        .expect_err("batch is full");
    assert_eq!(err.code(), "E006");

    // 带批次创建
    let err = storage
        .create_user_impl(CreateUserRequest {
            name: "erin".to_string(),
            email: "erin@academy.test".to_string(),
            password: "hashed".to_string(),
            role: UserRole::Learner,
            phone: None,
            subject: None,
            profile_image: None,
            batch_id: Some(b),
        })
        .await
        .expect_err("batch is full");
    assert_eq!(err.code(), "E006");
    assert!(
        storage
            .get_user_by_email_impl("erin@academy.test")
            .await
            .expect("query")
            .is_none()
    );

    let full = load(&storage, b).await;
    assert_eq!(full.student_ids, vec![a, c]);
    assert_eq!(batch_of(&storage, d).await, None);

    // 满员后仍可移除
    let after = storage
        .reconcile_batch_students_impl(b, MembershipMode::Remove, vec![a], None)
        .await
        .expect("remove");
    assert_eq!(after.student_ids, vec![c]);
}

#[tokio::test]
async fn test_update_user_with_batch_commits_together() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    let a = user(&storage, "alice", UserRole::Learner).await;

    let updated = storage
        .update_user_impl(
            a,
            UserChanges {
                name: Some("Alice Moved".to_string()),
                batch_id: Some(b),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("user exists");
    assert_eq!(updated.name, "Alice Moved");
    assert_eq!(updated.batch_id, Some(b));
    assert_eq!(load(&storage, b).await.student_ids, vec![a]);
}

#[tokio::test]
async fn test_update_user_rolls_back_fields_when_batch_move_fails() {
    let storage = storage().await;
    let a = user(&storage, "alice", UserRole::Learner).await;

    let err = storage
        .update_user_impl(
            a,
            UserChanges {
                name: Some("Renamed".to_string()),
                batch_id: Some(9_999),
                ..Default::default()
            },
        )
        .await
        .expect_err("batch does not exist");
    assert_eq!(err.code(), "E007");

    let stored = storage
        .get_user_by_id_impl(a)
        .await
        .expect("query")
        .expect("user exists");
    assert_eq!(stored.name, "alice");
    assert_eq!(stored.batch_id, None);
}

#[tokio::test]
async fn test_update_user_email_conflict_does_not_move() {
    let storage = storage().await;
    let b = batch(&storage, "B").await;
    user(&storage, "alice", UserRole::Learner).await;
    let c = user(&storage, "carol", UserRole::Learner).await;

    let result = storage
        .update_user_impl(
            c,
            UserChanges {
                email: Some("alice@academy.test".to_string()),
                batch_id: Some(b),
                ..Default::default()
            },
        )
        .await;
    assert!(result.is_err());
    assert_eq!(batch_of(&storage, c).await, None);
    assert!(load(&storage, b).await.student_ids.is_empty());
}
