use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_tables::{BatchStudents, Classes, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 同一学员在同一批次中只能出现一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batch_students_batch_user")
                    .table(BatchStudents::Table)
                    .col(BatchStudents::BatchId)
                    .col(BatchStudents::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_batch_students_user")
                    .table(BatchStudents::Table)
                    .col(BatchStudents::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_batch")
                    .table(Users::Table)
                    .col(Users::BatchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_classes_batch_date")
                    .table(Classes::Table)
                    .col(Classes::BatchId)
                    .col(Classes::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_classes_trainer_date")
                    .table(Classes::Table)
                    .col(Classes::TrainerId)
                    .col(Classes::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_classes_trainer_date")
                    .table(Classes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_classes_batch_date")
                    .table(Classes::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_users_batch")
                    .table(Users::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_batch_students_user")
                    .table(BatchStudents::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_batch_students_batch_user")
                    .table(BatchStudents::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
