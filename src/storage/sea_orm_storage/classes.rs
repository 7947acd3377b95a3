//! 课程存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::batches::{Column as BatchColumn, Entity as Batches};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes, Model as ClassModel};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{AcademyError, Result};
use crate::models::batches::entities::BatchSummary;
use crate::models::classes::{
    entities::{Class, ClassDetail, ClassStatus},
    requests::{ClassChanges, ClassListQuery, NewClass},
};
use crate::models::common::date::date_to_timestamp;
use crate::models::users::responses::UserSummary;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建课程
    pub async fn create_class_impl(&self, req: NewClass) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_name: Set(req.class_name),
            batch_id: Set(req.batch_id),
            trainer_id: Set(req.trainer_id),
            date: Set(date_to_timestamp(req.date)),
            start_time: Set(req.start_time),
            end_time: Set(req.end_time),
            teams_link: Set(req.teams_link),
            recording_link: Set(String::new()),
            status: Set(ClassStatus::Scheduled.to_string()),
            description: Set(req.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_class())
    }

    /// 通过 ID 获取课程
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 获取课程详情
    pub async fn get_class_detail_impl(&self, class_id: i64) -> Result<Option<ClassDetail>> {
        let Some(model) = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询课程失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut details = self.populate_classes(vec![model]).await?;
        Ok(details.pop())
    }

    /// 列出课程
    ///
    /// 默认按日期、开始时间升序；录像列表按日期倒序。
    pub async fn list_class_details_impl(&self, query: ClassListQuery) -> Result<Vec<ClassDetail>> {
        let mut select = Classes::find();

        if let Some(batch_ids) = query.batch_ids {
            if batch_ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(Column::BatchId.is_in(batch_ids));
        }

        if let Some(trainer_id) = query.trainer_id {
            select = select.filter(Column::TrainerId.eq(trainer_id));
        }

        if let Some(date) = query.date {
            select = select.filter(Column::Date.eq(date_to_timestamp(date)));
        }

        if query.with_recording {
            select = select.filter(Column::RecordingLink.ne(""));
        }

        select = if query.newest_first {
            select
                .order_by_desc(Column::Date)
                .order_by_desc(Column::StartTime)
        } else {
            select
                .order_by_asc(Column::Date)
                .order_by_asc(Column::StartTime)
        };

        let models = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询课程列表失败: {e}")))?;

        self.populate_classes(models).await
    }

    /// 展开批次与讲师，批次不存在时为 None
    async fn populate_classes(&self, models: Vec<ClassModel>) -> Result<Vec<ClassDetail>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch_ids: Vec<i64> = models.iter().map(|m| m.batch_id).collect();
        batch_ids.sort_unstable();
        batch_ids.dedup();
        let mut trainer_ids: Vec<i64> = models.iter().map(|m| m.trainer_id).collect();
        trainer_ids.sort_unstable();
        trainer_ids.dedup();

        let batches: HashMap<i64, BatchSummary> = Batches::find()
            .filter(BatchColumn::Id.is_in(batch_ids))
            .all(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询批次失败: {e}")))?
            .into_iter()
            .map(|m| (m.id, m.into_summary()))
            .collect();

        let trainers: HashMap<i64, UserSummary> = Users::find()
            .filter(UserColumn::Id.is_in(trainer_ids))
            .all(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("查询讲师失败: {e}")))?
            .into_iter()
            .map(|m| {
                let mut summary = m.into_summary();
                summary.subject = None;
                (summary.id, summary)
            })
            .collect();

        Ok(models
            .into_iter()
            .map(|m| {
                let batch = batches.get(&m.batch_id).cloned();
                let trainer = trainers.get(&m.trainer_id).cloned();
                ClassDetail::new(m.into_class(), batch, trainer)
            })
            .collect())
    }

    /// 更新课程
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: ClassChanges,
    ) -> Result<Option<Class>> {
        // 先检查课程是否存在
        let existing = self.get_class_by_id_impl(class_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(class_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(class_name) = update.class_name {
            model.class_name = Set(class_name);
        }
        if let Some(batch_id) = update.batch_id {
            model.batch_id = Set(batch_id);
        }
        if let Some(date) = update.date {
            model.date = Set(date_to_timestamp(date));
        }
        if let Some(start_time) = update.start_time {
            model.start_time = Set(start_time);
        }
        if let Some(end_time) = update.end_time {
            model.end_time = Set(end_time);
        }
        if let Some(teams_link) = update.teams_link {
            model.teams_link = Set(teams_link);
        }
        if let Some(recording_link) = update.recording_link {
            model.recording_link = Set(recording_link);
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("更新课程失败: {e}")))?;

        self.get_class_by_id_impl(class_id).await
    }

    /// 删除课程
    pub async fn delete_class_impl(&self, class_id: i64) -> Result<bool> {
        let result = Classes::delete_by_id(class_id)
            .exec(&self.db)
            .await
            .map_err(|e| AcademyError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}
