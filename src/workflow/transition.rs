//! 审批状态机
//!
//! 流水线单向推进，终态不可再流转：
//!
//! ```text
//! draft ──submit(员工)──▶ pending_team_leader ──approve(团队领导)──▶ pending_center_director
//!   │                            │                                        │
//!   │                            └──reject──▶ rejected                    ├──approve(中心主任)──▶ approved
//!   └──submit(团队领导本人草稿)──────────────────────────────────────────▶┘ └──reject──▶ rejected
//! ```
//!
//! 团队领导的 approve 直接把订单转入中心主任阶段，不存在单独的转呈步骤。

use super::WorkflowError;
use crate::db::models::{Decision, OrderStatus, Role};

/// 批量上报 (submit) 的目标状态
///
/// 只有草稿可以上报：员工草稿进入团队领导阶段，
/// 团队领导本人的草稿跳过本部门审批、直接进入中心主任阶段。
pub fn submit_target(status: OrderStatus, role: Role) -> Result<OrderStatus, WorkflowError> {
    match (status, role) {
        (OrderStatus::Draft, Role::Employee) => Ok(OrderStatus::PendingTeamLeader),
        (OrderStatus::Draft, Role::TeamLeader) => Ok(OrderStatus::PendingCenterDirector),
        (OrderStatus::Draft, Role::CenterDirector) => Err(WorkflowError::RoleNotAllowed(
            "Center director does not submit orders".to_string(),
        )),
        (status, _) => Err(WorkflowError::InvalidTransition(format!(
            "Only drafts can be submitted (current status: {})",
            status
        ))),
    }
}

/// 审批决定 (decide) 的目标状态
///
/// 团队领导只能审批 `pending_team_leader`，中心主任只能审批
/// `pending_center_director`；其余组合一律拒绝。
pub fn decide_target(
    status: OrderStatus,
    role: Role,
    decision: Decision,
) -> Result<OrderStatus, WorkflowError> {
    match (status, role) {
        (OrderStatus::PendingTeamLeader, Role::TeamLeader) => Ok(match decision {
            Decision::Approve => OrderStatus::PendingCenterDirector,
            Decision::Reject => OrderStatus::Rejected,
        }),
        (OrderStatus::PendingCenterDirector, Role::CenterDirector) => Ok(match decision {
            Decision::Approve => OrderStatus::Approved,
            Decision::Reject => OrderStatus::Rejected,
        }),
        (_, Role::Employee) => Err(WorkflowError::RoleNotAllowed(
            "Employees cannot approve or reject orders".to_string(),
        )),
        (status, role) => Err(WorkflowError::InvalidTransition(format!(
            "Order in status '{}' cannot be decided by role '{}'",
            status, role
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL_STATUSES: [OrderStatus; 5] = [
        Draft,
        PendingTeamLeader,
        PendingCenterDirector,
        Approved,
        Rejected,
    ];

    #[test]
    fn submit_advances_exactly_one_stage() {
        assert_eq!(submit_target(Draft, Role::Employee), Ok(PendingTeamLeader));
        assert_eq!(
            submit_target(Draft, Role::TeamLeader),
            Ok(PendingCenterDirector)
        );
    }

    #[test]
    fn submit_rejects_non_drafts() {
        for status in [PendingTeamLeader, PendingCenterDirector, Approved, Rejected] {
            for role in [Role::Employee, Role::TeamLeader] {
                assert!(matches!(
                    submit_target(status, role),
                    Err(WorkflowError::InvalidTransition(_))
                ));
            }
        }
    }

    #[test]
    fn center_director_never_submits() {
        assert!(matches!(
            submit_target(Draft, Role::CenterDirector),
            Err(WorkflowError::RoleNotAllowed(_))
        ));
    }

    #[test]
    fn team_leader_approve_forwards_to_director() {
        assert_eq!(
            decide_target(PendingTeamLeader, Role::TeamLeader, Decision::Approve),
            Ok(PendingCenterDirector)
        );
        assert_eq!(
            decide_target(PendingTeamLeader, Role::TeamLeader, Decision::Reject),
            Ok(Rejected)
        );
    }

    #[test]
    fn center_director_decides_final_stage() {
        assert_eq!(
            decide_target(PendingCenterDirector, Role::CenterDirector, Decision::Approve),
            Ok(Approved)
        );
        assert_eq!(
            decide_target(PendingCenterDirector, Role::CenterDirector, Decision::Reject),
            Ok(Rejected)
        );
    }

    #[test]
    fn terminal_statuses_reject_every_decision() {
        for status in [Approved, Rejected] {
            for role in [Role::TeamLeader, Role::CenterDirector] {
                for decision in [Decision::Approve, Decision::Reject] {
                    assert!(matches!(
                        decide_target(status, role, decision),
                        Err(WorkflowError::InvalidTransition(_))
                    ));
                }
            }
        }
    }

    #[test]
    fn roles_cannot_act_outside_their_stage() {
        // 团队领导不能越级终审，中心主任不能审一级
        assert!(decide_target(PendingCenterDirector, Role::TeamLeader, Decision::Approve).is_err());
        assert!(decide_target(PendingTeamLeader, Role::CenterDirector, Decision::Approve).is_err());
        // 草稿谁都不能审
        assert!(decide_target(Draft, Role::TeamLeader, Decision::Approve).is_err());
        assert!(decide_target(Draft, Role::CenterDirector, Decision::Reject).is_err());
    }

    #[test]
    fn employees_never_decide() {
        for status in ALL_STATUSES {
            for decision in [Decision::Approve, Decision::Reject] {
                assert!(matches!(
                    decide_target(status, Role::Employee, decision),
                    Err(WorkflowError::RoleNotAllowed(_))
                ));
            }
        }
    }

    #[test]
    fn no_edge_skips_the_pipeline() {
        // draft 永远无法直接到达 approved
        for role in [Role::Employee, Role::TeamLeader, Role::CenterDirector] {
            if let Ok(next) = submit_target(Draft, role) {
                assert_ne!(next, Approved);
            }
        }
    }
}
