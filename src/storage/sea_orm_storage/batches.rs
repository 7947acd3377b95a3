//! 批次存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use super::membership::{clear_batch_members, load_member_ids, reconcile_in_txn};
use crate::entity::batch_students::{Column as MemberColumn, Entity as BatchStudents};
use crate::entity::batches::{ActiveModel, Column, Entity as Batches, Model as BatchModel};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AcademyError, Result};
use crate::models::batches::{
    entities::{Batch, BatchDetail},
    membership::MembershipMode,
    requests::{BatchChanges, CreateBatchRequest},
};
use crate::models::common::date::date_to_timestamp;
use crate::models::users::responses::UserSummary;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

impl SeaOrmStorage {
    /// 创建批次
    pub async fn create_batch_impl(&self, req: CreateBatchRequest) -> Result<Batch> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            subject: Set(req.subject),
            trainer_id: Set(req.trainer_id),
            start_date: Set(date_to_timestamp(req.start_date)),
            end_date: Set(date_to_timestamp(req.end_date)),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("创建批次失败: {e}")))?;

        Ok(result.into_batch(Vec::new()))
    }

    /// 通过 ID 获取批次
    pub async fn get_batch_by_id_impl(&self, batch_id: i64) -> Result<Option<Batch>> {
        let Some(model) = Batches::find_by_id(batch_id)
            .one(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?
        else {
            return Ok(None);
        };

        let student_ids = load_member_ids(&self.db, batch_id).await?;
        Ok(Some(model.into_batch(student_ids)))
    }

    /// 获取批次详情
    pub async fn get_batch_detail_impl(&self, batch_id: i64) -> Result<Option<BatchDetail>> {
        let Some(model) = Batches::find_by_id(batch_id)
            .one(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut details = self.populate_batches(vec![model]).await?;
        Ok(details.pop())
    }

    /// 列出全部批次详情
    pub async fn list_batch_details_impl(&self) -> Result<Vec<BatchDetail>> {
        let models = Batches::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询批次列表失败: {e}")))?;

        self.populate_batches(models).await
    }

    /// 展开讲师与学员
    async fn populate_batches(&self, models: Vec<BatchModel>) -> Result<Vec<BatchDetail>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let batch_ids: Vec<i64> = models.iter().map(|m| m.id).collect();

        let members = BatchStudents::find()
            .filter(MemberColumn::BatchId.is_in(batch_ids))
            .order_by_asc(MemberColumn::BatchId)
            .order_by_asc(MemberColumn::Position)
            .order_by_asc(MemberColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询批次成员失败: {e}")))?;

        let mut user_ids: Vec<i64> = members.iter().map(|m| m.user_id).collect();
        user_ids.extend(models.iter().filter_map(|m| m.trainer_id));
        user_ids.sort_unstable();
        user_ids.dedup();

        let users: HashMap<i64, UserSummary> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(UserColumn::Id.is_in(user_ids))
                .all(&self.db)
                .await
                .map_err(|e| AcademyError::database_operation(format!("查询用户失败: {e}")))?
                .into_iter()
                .map(|m| (m.id, m.into_summary()))
                .collect()
        };

        let mut students_by_batch: HashMap<i64, Vec<UserSummary>> = HashMap::new();
        for member in &members {
            if let Some(user) = users.get(&member.user_id) {
                let mut student = user.clone();
                // 学员摘要不展示 subject
                student.subject = None;
                students_by_batch
                    .entry(member.batch_id)
                    .or_default()
                    .push(student);
            }
        }

        Ok(models
            .into_iter()
            .map(|m| {
                let trainer = m.trainer_id.and_then(|id| users.get(&id).cloned());
                let students = students_by_batch.remove(&m.id).unwrap_or_default();
                let batch = m.into_batch(Vec::new());
                BatchDetail {
                    id: batch.id,
                    name: batch.name,
                    subject: batch.subject,
                    trainer,
                    students,
                    start_date: batch.start_date,
                    end_date: batch.end_date,
                    version: batch.version,
                    created_at: batch.created_at,
                    updated_at: batch.updated_at,
                }
            })
            .collect())
    }

    /// 更新批次
    ///
    /// 字段更新与成员同步在同一事务内完成，任一步失败全部回滚。
    pub async fn update_batch_impl(
        &self,
        batch_id: i64,
        changes: BatchChanges,
        students: Option<Vec<i64>>,
        expected_version: Option<i64>,
    ) -> Result<Option<Batch>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AcademyError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = Batches::find_by_id(batch_id)
            .one(&txn)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?
        else {
            return Ok(None);
        };

        if let Some(expected) = expected_version
            && expected != existing.version
        {
            return Err(AcademyError::conflict(format!(
                "Batch {batch_id} has been modified (version {} != {expected}), please reload and retry",
                existing.version
            )));
        }

        if !changes.is_empty() {
            let mut model = ActiveModel {
                id: Set(batch_id),
                updated_at: Set(chrono::Utc::now().timestamp()),
                ..Default::default()
            };

            if let Some(name) = changes.name {
                model.name = Set(name);
            }
            if let Some(subject) = changes.subject {
                model.subject = Set(subject);
            }
            if let Some(trainer_id) = changes.trainer_id {
                model.trainer_id = Set(trainer_id);
            }
            if let Some(start_date) = changes.start_date {
                model.start_date = Set(date_to_timestamp(start_date));
            }
            if let Some(end_date) = changes.end_date {
                model.end_date = Set(date_to_timestamp(end_date));
            }

            model
                .update(&txn)
                .await
                .map_err(|e| AcademyError::database_operation(format!("更新批次失败: {e}")))?;
        }

        let batch = match students {
            Some(ids) => {
                reconcile_in_txn(
                    &txn,
                    batch_id,
                    MembershipMode::Sync,
                    &ids,
                    None,
                    self.max_batch_students,
                )
                .await?
            }
            None => {
                let student_ids = load_member_ids(&txn, batch_id).await?;
                Batches::find_by_id(batch_id)
                    .one(&txn)
                    .await
                    .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?
                    .ok_or_else(|| AcademyError::not_found(format!("Batch not found: {batch_id}")))?
                    .into_batch(student_ids)
            }
        };

        txn.commit()
            .await
            .map_err(|e| AcademyError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(batch))
    }

    /// 删除批次
    ///
    /// 清除学员的批次引用后删除批次，课程不级联删除。
    pub async fn delete_batch_impl(&self, batch_id: i64) -> Result<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AcademyError::database_operation(format!("开启事务失败: {e}")))?;

        let cleared = clear_batch_members(&txn, batch_id).await?;

        let result = Batches::delete_by_id(batch_id)
            .exec(&txn)
            .await
            .map_err(|e| AcademyError::database_operation(format!("删除批次失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| AcademyError::database_operation(format!("提交事务失败: {e}")))?;

        if result.rows_affected > 0 {
            info!("Batch {} deleted, {} learners detached", batch_id, cleared);
        }
        Ok(result.rows_affected > 0)
    }

    /// 学员所在的批次 ID
    pub async fn list_batch_ids_for_student_impl(&self, user_id: i64) -> Result<Vec<i64>> {
        let rows = BatchStudents::find()
            .filter(MemberColumn::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询学员批次失败: {e}")))?;

        let mut ids: Vec<i64> = rows.into_iter().map(|m| m.batch_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
