//! 统一的权限判断
//!
//! 服务层在修改资源前调用 [`authorize`]，路由上的 `RequireRole` 只做粗粒度拦截。

use crate::errors::{AcademyError, Result};
use crate::models::users::entities::{User, UserRole};

/// 受控操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// 创建 / 删除用户、调整角色与批次
    ManageUsers,
    /// 修改个人资料
    UpdateProfile,
    /// 批次及其成员
    ManageBatches,
    /// 以 owner 身份创建课程
    CreateClass,
    /// 修改 / 删除课程
    ManageClass,
    /// 设置 / 清除录像链接
    ManageRecording,
    Read,
}

/// 判断 `actor` 能否对属于 `owner` 的资源执行 `action`
///
/// `owner` 为资源归属用户的 ID（课程的讲师、资料所属用户），无归属时传 `None`。
pub fn authorize(actor: &User, action: Action, owner: Option<i64>) -> Result<()> {
    if actor.role == UserRole::Admin || action == Action::Read {
        return Ok(());
    }

    let owns = owner == Some(actor.id);
    let allowed = match action {
        Action::ManageUsers | Action::ManageBatches => false,
        Action::UpdateProfile => owns,
        Action::CreateClass | Action::ManageClass | Action::ManageRecording => {
            actor.role == UserRole::Trainer && owns
        }
        Action::Read => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(AcademyError::authorization(format!(
            "User {} ({}) is not allowed to {:?}",
            actor.id, actor.role, action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            name: format!("user{id}"),
            email: format!("user{id}@academy.io"),
            password_hash: String::new(),
            role,
            phone: None,
            subject: None,
            profile_image: None,
            batch_id: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_admin_can_do_everything() {
        let admin = user(1, UserRole::Admin);
        for action in [
            Action::ManageUsers,
            Action::UpdateProfile,
            Action::ManageBatches,
            Action::CreateClass,
            Action::ManageClass,
            Action::ManageRecording,
        ] {
            assert!(authorize(&admin, action, Some(99)).is_ok());
        }
    }

    #[test]
    fn test_trainer_owns_classes() {
        let trainer = user(5, UserRole::Trainer);
        assert!(authorize(&trainer, Action::CreateClass, Some(5)).is_ok());
        assert!(authorize(&trainer, Action::CreateClass, Some(6)).is_err());
        assert!(authorize(&trainer, Action::ManageClass, Some(5)).is_ok());
        assert!(authorize(&trainer, Action::ManageRecording, Some(6)).is_err());
        assert!(authorize(&trainer, Action::ManageBatches, None).is_err());
    }

    #[test]
    fn test_learner_limits() {
        let learner = user(9, UserRole::Learner);
        assert!(authorize(&learner, Action::Read, None).is_ok());
        assert!(authorize(&learner, Action::UpdateProfile, Some(9)).is_ok());
        assert!(authorize(&learner, Action::UpdateProfile, Some(10)).is_err());
        assert!(authorize(&learner, Action::ManageClass, Some(9)).is_err());

        let err = authorize(&learner, Action::ManageUsers, None).unwrap_err();
        assert_eq!(err.status_code(), actix_web::http::StatusCode::FORBIDDEN);
    }
}
