use std::sync::Arc;

use crate::models::{
    PaginatedResponse,
    batches::{
        entities::{Batch, BatchDetail},
        membership::MembershipMode,
        requests::{BatchChanges, CreateBatchRequest},
    },
    classes::{
        entities::{Class, ClassDetail},
        requests::{ClassChanges, ClassListQuery, NewClass},
    },
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UserChanges, UserListQuery},
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 已是哈希值），指定批次时在同一事务内加入该批次
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(
        &self,
        query: UserListQuery,
    ) -> Result<PaginatedResponse<User>>;
    // 按角色列出全部用户
    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>>;
    // 更新用户信息；batch_id 存在时在同一事务内追加到该批次
    async fn update_user(&self, id: i64, update: UserChanges) -> Result<Option<User>>;
    // 删除用户，同时移除其批次成员关系
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 批次管理方法
    // 创建批次
    async fn create_batch(&self, batch: CreateBatchRequest) -> Result<Batch>;
    // 通过ID获取批次
    async fn get_batch_by_id(&self, batch_id: i64) -> Result<Option<Batch>>;
    // 获取批次详情（讲师、学员已展开）
    async fn get_batch_detail(&self, batch_id: i64) -> Result<Option<BatchDetail>>;
    // 列出全部批次详情
    async fn list_batch_details(&self) -> Result<Vec<BatchDetail>>;
    // 更新批次字段；students 存在时在同一事务内按同步语义替换成员
    async fn update_batch(
        &self,
        batch_id: i64,
        changes: BatchChanges,
        students: Option<Vec<i64>>,
        expected_version: Option<i64>,
    ) -> Result<Option<Batch>>;
    // 删除批次，清除学员的批次引用
    async fn delete_batch(&self, batch_id: i64) -> Result<bool>;
    // 批次成员调整（追加 / 同步 / 移除），单事务内同时维护学员的批次引用
    async fn reconcile_batch_students(
        &self,
        batch_id: i64,
        mode: MembershipMode,
        student_ids: Vec<i64>,
        expected_version: Option<i64>,
    ) -> Result<Batch>;
    // 学员所在的批次
    async fn list_batch_ids_for_student(&self, user_id: i64) -> Result<Vec<i64>>;

    /// 课程管理方法
    // 创建课程
    async fn create_class(&self, class: NewClass) -> Result<Class>;
    // 通过ID获取课程
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    // 获取课程详情（批次、讲师已展开）
    async fn get_class_detail(&self, class_id: i64) -> Result<Option<ClassDetail>>;
    // 列出课程详情
    async fn list_class_details(&self, query: ClassListQuery) -> Result<Vec<ClassDetail>>;
    // 更新课程
    async fn update_class(&self, class_id: i64, update: ClassChanges) -> Result<Option<Class>>;
    // 删除课程
    async fn delete_class(&self, class_id: i64) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
