//! 角色范围裁剪
//!
//! 把调用方提交的可选筛选条件 ([`OrderFilter`]) 按角色解析为有效的
//! 查询范围 ([`OrderScope`])。缺省字段表示"无约束"，而不是"空集"。
//!
//! | 角色 | 隐含范围 | department 筛选 | member 筛选 |
//! |------|----------|-----------------|-------------|
//! | 员工 | 本人订单 | 拒绝 | 拒绝 |
//! | 团队领导 | 本部门 | 拒绝 (只有一个部门) | 限本部门成员 |
//! | 中心主任 | 全部门 | 允许 | 允许 |
//!
//! 越权的筛选条件直接报错而不是静默忽略，避免调用方误以为结果被其筛选过。

use super::WorkflowError;
use crate::db::models::{OrderStatus, Role};

/// 调用方提交的筛选条件，字段缺省表示无约束
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub department_id: Option<String>,
    pub member_id: Option<String>,
    pub statuses: Option<Vec<OrderStatus>>,
}

/// 解析后的有效查询范围，交给 `OrderRepository::list` 组装 SQL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderScope {
    /// 限定订单所有者
    pub owner_id: Option<String>,
    /// 限定部门
    pub department_id: Option<String>,
    /// 限定状态集合
    pub statuses: Option<Vec<OrderStatus>>,
}

/// 按角色把筛选条件解析为有效范围
///
/// `actor_department` 为调用方所属部门 (中心主任为 None)。
/// 团队领导的 member 筛选只做范围合并，成员是否属于本部门由服务层校验。
pub fn resolve_scope(
    role: Role,
    actor_id: &str,
    actor_department: Option<&str>,
    filter: OrderFilter,
) -> Result<OrderScope, WorkflowError> {
    match role {
        Role::Employee => {
            if filter.department_id.is_some() {
                return Err(WorkflowError::Validation(
                    "Employees cannot filter by department".to_string(),
                ));
            }
            if filter.member_id.is_some() {
                return Err(WorkflowError::Validation(
                    "Employees cannot filter by member".to_string(),
                ));
            }
            Ok(OrderScope {
                owner_id: Some(actor_id.to_string()),
                department_id: None,
                statuses: filter.statuses,
            })
        }
        Role::TeamLeader => {
            if filter.department_id.is_some() {
                return Err(WorkflowError::Validation(
                    "Team leaders are scoped to their own department".to_string(),
                ));
            }
            let department = actor_department.ok_or_else(|| {
                WorkflowError::Validation("Team leader has no department".to_string())
            })?;
            Ok(OrderScope {
                owner_id: filter.member_id,
                department_id: Some(department.to_string()),
                statuses: filter.statuses,
            })
        }
        Role::CenterDirector => Ok(OrderScope {
            owner_id: filter.member_id,
            department_id: filter.department_id,
            statuses: filter.statuses,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(
        department_id: Option<&str>,
        member_id: Option<&str>,
        statuses: Option<Vec<OrderStatus>>,
    ) -> OrderFilter {
        OrderFilter {
            department_id: department_id.map(String::from),
            member_id: member_id.map(String::from),
            statuses,
        }
    }

    #[test]
    fn employee_is_always_scoped_to_self() {
        let scope = resolve_scope(Role::Employee, "m1", Some("d1"), OrderFilter::default())
            .expect("default filter must resolve");
        assert_eq!(scope.owner_id.as_deref(), Some("m1"));
        assert_eq!(scope.department_id, None);
    }

    #[test]
    fn employee_foreign_filters_are_rejected() {
        assert!(resolve_scope(Role::Employee, "m1", Some("d1"), filter(Some("d2"), None, None)).is_err());
        assert!(resolve_scope(Role::Employee, "m1", Some("d1"), filter(None, Some("m2"), None)).is_err());
    }

    #[test]
    fn team_leader_is_pinned_to_own_department() {
        let scope = resolve_scope(
            Role::TeamLeader,
            "lead",
            Some("d1"),
            filter(None, Some("m2"), Some(vec![OrderStatus::PendingTeamLeader])),
        )
        .expect("member/status filters are allowed");
        assert_eq!(scope.department_id.as_deref(), Some("d1"));
        assert_eq!(scope.owner_id.as_deref(), Some("m2"));
        assert_eq!(scope.statuses, Some(vec![OrderStatus::PendingTeamLeader]));
    }

    #[test]
    fn team_leader_department_filter_is_rejected() {
        assert!(resolve_scope(Role::TeamLeader, "lead", Some("d1"), filter(Some("d2"), None, None)).is_err());
    }

    #[test]
    fn center_director_filters_are_conjunctive_and_optional() {
        let scope = resolve_scope(Role::CenterDirector, "dir", None, OrderFilter::default())
            .expect("no filters means no constraints");
        assert_eq!(scope, OrderScope::default());

        let scope = resolve_scope(
            Role::CenterDirector,
            "dir",
            None,
            filter(Some("d2"), Some("m9"), Some(vec![OrderStatus::Rejected])),
        )
        .expect("all filters are allowed");
        assert_eq!(scope.department_id.as_deref(), Some("d2"));
        assert_eq!(scope.owner_id.as_deref(), Some("m9"));
        assert_eq!(scope.statuses, Some(vec![OrderStatus::Rejected]));
    }
}
