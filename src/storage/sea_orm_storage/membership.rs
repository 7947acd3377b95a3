//! 批次成员事务
//!
//! 在同一事务内更新批次成员列表（batch_students）和学员的批次引用（users.batch_id），
//! 保证：学员 U 的 batch_id == B 当且仅当 B 的成员列表包含 U。

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use crate::entity::batch_students::{
    ActiveModel as MemberActiveModel, Column as MemberColumn, Entity as BatchStudents,
};
use crate::entity::batches::{Column as BatchColumn, Entity as Batches, Model as BatchModel};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AcademyError, Result};
use crate::models::batches::entities::Batch;
use crate::models::batches::membership::{MembershipMode, MembershipPlan};
use crate::models::users::entities::UserRole;

impl SeaOrmStorage {
    /// 成员调整入口：开启事务、执行、提交
    pub async fn reconcile_batch_students_impl(
        &self,
        batch_id: i64,
        mode: MembershipMode,
        student_ids: Vec<i64>,
        expected_version: Option<i64>,
    ) -> Result<Batch> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AcademyError::database_operation(format!("开启事务失败: {e}")))?;

        // 出错时 txn 被 drop，自动回滚
        let batch = reconcile_in_txn(
            &txn,
            batch_id,
            mode,
            &student_ids,
            expected_version,
            self.max_batch_students,
        )
        .await?;

        txn.commit()
            .await
            .map_err(|e| AcademyError::database_operation(format!("提交事务失败: {e}")))?;

        info!(
            "Batch {} students reconciled ({}), {} members, version {}",
            batch_id,
            mode,
            batch.student_ids.len(),
            batch.version
        );
        Ok(batch)
    }
}

pub(crate) async fn load_member_ids<C>(conn: &C, batch_id: i64) -> Result<Vec<i64>>
where
    C: sea_orm::ConnectionTrait,
{
    let rows = BatchStudents::find()
        .filter(MemberColumn::BatchId.eq(batch_id))
        .order_by_asc(MemberColumn::Position)
        .order_by_asc(MemberColumn::Id)
        .all(conn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询批次成员失败: {e}")))?;

    Ok(rows.into_iter().map(|m| m.user_id).collect())
}

/// 在已开启的事务内调整批次成员
///
/// 1. 读取批次和当前成员，批次不存在返回 NotFound
/// 2. 计算成员计划，校验人数上限以及所有需要关联的 ID 都是学员
/// 3. 以版本号做乐观锁更新批次，重写成员列表
/// 4. 将关联学员从其他批次移出（一个学员只属于一个批次）
/// 5. 批量设置 / 清除学员的 batch_id
pub(crate) async fn reconcile_in_txn(
    txn: &DatabaseTransaction,
    batch_id: i64,
    mode: MembershipMode,
    requested: &[i64],
    expected_version: Option<i64>,
    max_students: usize,
) -> Result<Batch> {
    let batch = Batches::find_by_id(batch_id)
        .one(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?
        .ok_or_else(|| AcademyError::not_found(format!("Batch not found: {batch_id}")))?;

    if let Some(expected) = expected_version
        && expected != batch.version
    {
        return Err(AcademyError::conflict(format!(
            "Batch {batch_id} has been modified (version {} != {expected}), please reload and retry",
            batch.version
        )));
    }

    let member_rows = BatchStudents::find()
        .filter(MemberColumn::BatchId.eq(batch_id))
        .order_by_asc(MemberColumn::Position)
        .order_by_asc(MemberColumn::Id)
        .all(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询批次成员失败: {e}")))?;
    let current: Vec<i64> = member_rows.iter().map(|m| m.user_id).collect();

    let plan = MembershipPlan::build(mode, &current, requested);
    debug!(
        "Batch {} plan: +{:?} -{:?} target {:?}",
        batch_id, plan.to_add, plan.to_remove, plan.target
    );

    plan.ensure_capacity(max_students)?;
    ensure_learners(txn, &plan.to_link).await?;

    let now = chrono::Utc::now().timestamp();
    let mut version = batch.version;

    if plan.changes_membership(&current) {
        version = bump_version(txn, &batch, now).await?;

        // 保留原有成员的加入时间
        let joined_at: HashMap<i64, i64> = member_rows
            .iter()
            .map(|m| (m.user_id, m.joined_at))
            .collect();

        BatchStudents::delete_many()
            .filter(MemberColumn::BatchId.eq(batch_id))
            .exec(txn)
            .await
            .map_err(|e| AcademyError::database_operation(format!("清空批次成员失败: {e}")))?;

        if !plan.target.is_empty() {
            let rows = plan
                .target
                .iter()
                .enumerate()
                .map(|(position, &user_id)| MemberActiveModel {
                    batch_id: Set(batch_id),
                    user_id: Set(user_id),
                    position: Set(position as i32),
                    joined_at: Set(joined_at.get(&user_id).copied().unwrap_or(now)),
                    ..Default::default()
                });

            BatchStudents::insert_many(rows)
                .exec(txn)
                .await
                .map_err(|e| {
                    AcademyError::database_operation(format!("写入批次成员失败: {e}"))
                })?;
        }
    }

    if !plan.to_link.is_empty() {
        detach_from_other_batches(txn, batch_id, &plan.to_link, now).await?;

        Users::update_many()
            .col_expr(UserColumn::BatchId, Expr::value(batch_id))
            .col_expr(UserColumn::UpdatedAt, Expr::value(now))
            .filter(UserColumn::Id.is_in(plan.to_link.clone()))
            .filter(
                Condition::any()
                    .add(UserColumn::BatchId.is_null())
                    .add(UserColumn::BatchId.ne(batch_id)),
            )
            .exec(txn)
            .await
            .map_err(|e| AcademyError::database_operation(format!("设置学员批次失败: {e}")))?;
    }

    if !plan.to_remove.is_empty() {
        // 只清除仍指向本批次的引用
        Users::update_many()
            .col_expr(UserColumn::BatchId, Expr::value(Option::<i64>::None))
            .col_expr(UserColumn::UpdatedAt, Expr::value(now))
            .filter(UserColumn::Id.is_in(plan.to_remove.clone()))
            .filter(UserColumn::BatchId.eq(batch_id))
            .exec(txn)
            .await
            .map_err(|e| AcademyError::database_operation(format!("清除学员批次失败: {e}")))?;
    }

    let mut batch = batch;
    if version != batch.version {
        batch.version = version;
        batch.updated_at = now;
    }
    Ok(batch.into_batch(plan.target))
}

/// 乐观锁递增版本号，版本已变化时返回 Conflict
async fn bump_version(txn: &DatabaseTransaction, batch: &BatchModel, now: i64) -> Result<i64> {
    let next = batch.version + 1;
    let result = Batches::update_many()
        .col_expr(BatchColumn::Version, Expr::value(next))
        .col_expr(BatchColumn::UpdatedAt, Expr::value(now))
        .filter(BatchColumn::Id.eq(batch.id))
        .filter(BatchColumn::Version.eq(batch.version))
        .exec(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("更新批次版本失败: {e}")))?;

    if result.rows_affected == 0 {
        return Err(AcademyError::conflict(format!(
            "Batch {} was modified concurrently, please retry",
            batch.id
        )));
    }
    Ok(next)
}

/// 校验 ID 对应的用户存在且为学员
async fn ensure_learners(txn: &DatabaseTransaction, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let learners: HashSet<i64> = Users::find()
        .filter(UserColumn::Id.is_in(ids.to_vec()))
        .filter(UserColumn::Role.eq(UserRole::LEARNER))
        .all(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询学员失败: {e}")))?
        .into_iter()
        .map(|m| m.id)
        .collect();

    let invalid: Vec<String> = ids
        .iter()
        .filter(|id| !learners.contains(id))
        .map(|id| id.to_string())
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AcademyError::validation(format!(
            "Students must be existing learners, invalid IDs: {}",
            invalid.join(", ")
        )))
    }
}

/// 将学员从其他批次移出，并递增这些批次的版本号
async fn detach_from_other_batches(
    txn: &DatabaseTransaction,
    batch_id: i64,
    user_ids: &[i64],
    now: i64,
) -> Result<()> {
    let other_rows = BatchStudents::find()
        .filter(MemberColumn::UserId.is_in(user_ids.to_vec()))
        .filter(MemberColumn::BatchId.ne(batch_id))
        .all(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询学员所在批次失败: {e}")))?;

    if other_rows.is_empty() {
        return Ok(());
    }

    let row_ids: Vec<i64> = other_rows.iter().map(|m| m.id).collect();
    let mut other_batches: Vec<i64> = other_rows.iter().map(|m| m.batch_id).collect();
    other_batches.sort_unstable();
    other_batches.dedup();

    BatchStudents::delete_many()
        .filter(MemberColumn::Id.is_in(row_ids))
        .exec(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("移出原批次失败: {e}")))?;

    let batches = Batches::find()
        .filter(BatchColumn::Id.is_in(other_batches))
        .all(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询原批次失败: {e}")))?;

    for other in &batches {
        bump_version(txn, other, now).await?;
        info!(
            "Moved students out of batch {} into batch {}",
            other.id, batch_id
        );
    }

    Ok(())
}

/// 清除批次全部学员的引用并删除成员记录（删除批次前调用）
pub(crate) async fn clear_batch_members(txn: &DatabaseTransaction, batch_id: i64) -> Result<u64> {
    let now = chrono::Utc::now().timestamp();

    let result = Users::update_many()
        .col_expr(UserColumn::BatchId, Expr::value(Option::<i64>::None))
        .col_expr(UserColumn::UpdatedAt, Expr::value(now))
        .filter(UserColumn::BatchId.eq(batch_id))
        .exec(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("清除学员批次失败: {e}")))?;

    BatchStudents::delete_many()
        .filter(MemberColumn::BatchId.eq(batch_id))
        .exec(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("删除批次成员失败: {e}")))?;

    Ok(result.rows_affected)
}

/// 将用户从所有批次移出（删除用户前调用）
pub(crate) async fn remove_user_memberships(txn: &DatabaseTransaction, user_id: i64) -> Result<()> {
    let rows = BatchStudents::find()
        .filter(MemberColumn::UserId.eq(user_id))
        .all(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询用户所在批次失败: {e}")))?;

    if rows.is_empty() {
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp();
    let batch_ids: Vec<i64> = rows.iter().map(|m| m.batch_id).collect();

    BatchStudents::delete_many()
        .filter(MemberColumn::UserId.eq(user_id))
        .exec(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("删除用户批次关系失败: {e}")))?;

    let batches = Batches::find()
        .filter(BatchColumn::Id.is_in(batch_ids))
        .all(txn)
        .await
        .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?;

    for batch in &batches {
        bump_version(txn, batch, now).await?;
    }

    Ok(())
}
