//! 批次成员计划
//!
//! 根据当前成员列表与请求的学员列表计算最终成员、需要关联与需要解除关联的学员。
//! 纯计算，不访问存储；存储层在事务内按计划落库。

use std::collections::HashSet;

use serde_json::Value;

use crate::errors::{AcademyError, Result};

/// 成员变更方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipMode {
    /// 整体替换为请求列表
    Sync,
    /// 只追加，不移除
    Append,
    /// 只移除请求列表中已在批次内的学员
    Remove,
}

impl std::fmt::Display for MembershipMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipMode::Sync => write!(f, "sync"),
            MembershipMode::Append => write!(f, "append"),
            MembershipMode::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipPlan {
    /// 变更后的成员列表，保持顺序
    pub target: Vec<i64>,
    /// 新加入的学员（target - current）
    pub to_add: Vec<i64>,
    /// 被移出的学员（current - target）
    pub to_remove: Vec<i64>,
    /// 反向引用需要指向本批次的学员
    pub to_link: Vec<i64>,
}

impl MembershipPlan {
    pub fn build(mode: MembershipMode, current: &[i64], requested: &[i64]) -> Self {
        match mode {
            MembershipMode::Sync => Self::sync(current, requested),
            MembershipMode::Append => Self::append(current, requested),
            MembershipMode::Remove => Self::remove(current, requested),
        }
    }

    pub fn sync(current: &[i64], requested: &[i64]) -> Self {
        let target = dedupe(requested);
        let current_set: HashSet<i64> = current.iter().copied().collect();
        let target_set: HashSet<i64> = target.iter().copied().collect();

        let to_add = target
            .iter()
            .copied()
            .filter(|id| !current_set.contains(id))
            .collect();
        let to_remove = dedupe(current)
            .into_iter()
            .filter(|id| !target_set.contains(id))
            .collect();

        // 同步时所有目标学员的反向引用都要校正，已指向本批次的在落库时跳过
        Self {
            to_link: target.clone(),
            target,
            to_add,
            to_remove,
        }
    }

    pub fn append(current: &[i64], requested: &[i64]) -> Self {
        let mut target = dedupe(current);
        let mut seen: HashSet<i64> = target.iter().copied().collect();

        let mut to_add = Vec::new();
        for &id in requested {
            if seen.insert(id) {
                target.push(id);
                to_add.push(id);
            }
        }

        Self {
            to_link: to_add.clone(),
            target,
            to_add,
            to_remove: Vec::new(),
        }
    }

    pub fn remove(current: &[i64], requested: &[i64]) -> Self {
        let requested: HashSet<i64> = requested.iter().copied().collect();
        let (to_remove, target): (Vec<i64>, Vec<i64>) = dedupe(current)
            .into_iter()
            .partition(|id| requested.contains(id));

        Self {
            target,
            to_add: Vec::new(),
            to_remove,
            to_link: Vec::new(),
        }
    }

    /// 成员人数上限校验
    ///
    /// 只拦截会新增学员的计划；上限调低后仍允许对超员批次做移除。
    pub fn ensure_capacity(&self, limit: usize) -> Result<()> {
        if self.target.len() > limit && !self.to_add.is_empty() {
            return Err(AcademyError::validation(format!(
                "Students exceed the batch limit of {limit}, got {}",
                self.target.len()
            )));
        }
        Ok(())
    }

    /// 成员列表是否发生变化
    pub fn changes_membership(&self, current: &[i64]) -> bool {
        self.target.as_slice() != current
    }
}

/// 去重，保留首次出现的位置
pub fn dedupe(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// 解析请求中的学员 ID 列表
///
/// 必须是 JSON 数组；元素可以是正整数或只包含正整数的字符串。
/// 任意一个元素不合法时整体拒绝。返回值已去重。
pub fn parse_student_ids(value: &Value) -> Result<Vec<i64>> {
    let items = value
        .as_array()
        .ok_or_else(|| AcademyError::validation("studentIds must be an array"))?;

    let mut ids = Vec::with_capacity(items.len());
    let mut invalid = Vec::new();
    for item in items {
        match parse_student_id(item) {
            Some(id) => ids.push(id),
            None => invalid.push(item.to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(AcademyError::validation(format!(
            "Invalid student ID format in array: {}",
            invalid.join(", ")
        )));
    }

    Ok(dedupe(&ids))
}

fn parse_student_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse::<i64>().ok()?
        }
        _ => return None,
    };
    (id > 0).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sync_replaces_membership() {
        // B 有 [A, C]，同步为 [C, D]
        let plan = MembershipPlan::sync(&[1, 3], &[3, 4]);
        assert_eq!(plan.target, vec![3, 4]);
        assert_eq!(plan.to_add, vec![4]);
        assert_eq!(plan.to_remove, vec![1]);
        assert_eq!(plan.to_link, vec![3, 4]);
    }

    #[test]
    fn test_sync_with_empty_target_removes_everyone() {
        let plan = MembershipPlan::sync(&[5, 6, 7], &[]);
        assert!(plan.target.is_empty());
        assert!(plan.to_add.is_empty());
        assert_eq!(plan.to_remove, vec![5, 6, 7]);
    }

    #[test]
    fn test_sync_dedupes_keeping_first_occurrence() {
        let plan = MembershipPlan::sync(&[], &[9, 2, 9, 3, 2]);
        assert_eq!(plan.target, vec![9, 2, 3]);
        assert_eq!(plan.to_add, vec![9, 2, 3]);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let first = MembershipPlan::sync(&[1, 2], &[2, 3]);
        let second = MembershipPlan::sync(&first.target, &[2, 3]);
        assert_eq!(second.target, first.target);
        assert!(second.to_add.is_empty());
        assert!(second.to_remove.is_empty());
        assert!(!second.changes_membership(&first.target));
    }

    #[test]
    fn test_append_keeps_existing_order_and_skips_present() {
        let plan = MembershipPlan::append(&[1, 2], &[2, 5, 1, 6, 5]);
        assert_eq!(plan.target, vec![1, 2, 5, 6]);
        assert_eq!(plan.to_add, vec![5, 6]);
        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.to_link, vec![5, 6]);
    }

    #[test]
    fn test_append_already_present_is_noop() {
        let plan = MembershipPlan::append(&[1, 2], &[1, 2]);
        assert_eq!(plan.target, vec![1, 2]);
        assert!(plan.to_add.is_empty());
        assert!(!plan.changes_membership(&[1, 2]));
    }

    #[test]
    fn test_remove_only_drops_current_members() {
        let plan = MembershipPlan::remove(&[1, 2, 3], &[2, 8]);
        assert_eq!(plan.target, vec![1, 3]);
        assert_eq!(plan.to_remove, vec![2]);
        assert!(plan.to_add.is_empty());
        assert!(plan.to_link.is_empty());
    }

    #[test]
    fn test_capacity_rejects_growth_past_limit() {
        let plan = MembershipPlan::append(&[1, 2, 3], &[4]);
        let err = plan.ensure_capacity(3).expect_err("over limit");
        assert_eq!(err.code(), "E006");
        assert!(err.message().starts_with("Students exceed the batch limit of 3"));

        assert!(MembershipPlan::append(&[1, 2], &[4]).ensure_capacity(3).is_ok());
        assert!(MembershipPlan::sync(&[], &[1, 2, 3, 4]).ensure_capacity(3).is_err());
    }

    #[test]
    fn test_capacity_allows_shrinking_oversized_batch() {
        assert!(MembershipPlan::remove(&[1, 2, 3, 4, 5], &[5]).ensure_capacity(3).is_ok());
        assert!(MembershipPlan::sync(&[1, 2, 3, 4, 5], &[1, 2, 3, 4]).ensure_capacity(3).is_ok());
        assert!(MembershipPlan::append(&[1, 2, 3, 4], &[2]).ensure_capacity(3).is_ok());
    }

    #[test]
    fn test_build_dispatches_by_mode() {
        assert_eq!(
            MembershipPlan::build(MembershipMode::Sync, &[1], &[2]),
            MembershipPlan::sync(&[1], &[2])
        );
        assert_eq!(
            MembershipPlan::build(MembershipMode::Remove, &[1], &[1]).target,
            Vec::<i64>::new()
        );
    }

    #[test]
    fn test_parse_student_ids_accepts_numbers_and_numeric_strings() {
        let ids = parse_student_ids(&json!([3, "4", " 5 ", 3])).expect("valid ids");
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_parse_student_ids_empty_list() {
        assert!(parse_student_ids(&json!([])).expect("valid").is_empty());
    }

    #[test]
    fn test_parse_student_ids_rejects_non_array() {
        for body in [json!(null), json!("1,2"), json!({"id": 1}), json!(7)] {
            let err = parse_student_ids(&body).expect_err("must reject");
            assert_eq!(err.code(), "E006");
        }
    }

    #[test]
    fn test_parse_student_ids_rejects_malformed_elements() {
        for body in [
            json!([1, "abc"]),
            json!([1, -2]),
            json!([0]),
            json!([1.5]),
            json!(["12a"]),
            json!([null]),
            json!([[1]]),
            json!(["-3"]),
        ] {
            assert!(parse_student_ids(&body).is_err(), "{body} should be rejected");
        }
    }
}
