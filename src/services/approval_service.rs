//! Approval Service
//!
//! 审批决定与进度视图。状态前置条件检查两次：
//! 先由纯状态机表给出目标状态，再由条件更新在存储层原子确认 —
//! 同一订单上的并发审批只有一个能生效，另一个收到状态冲突错误。

use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::models::{Decision, Order, OrderStatus, OrderSummary, Role};
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppResult};
use crate::workflow::{self, OrderScope};

pub struct ApprovalService {
    orders: OrderRepository,
}

impl ApprovalService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// 审批订单
    ///
    /// 团队领导审批本部门 `pending_team_leader` 订单 (approve 直接转入
    /// 中心主任阶段)；中心主任终审 `pending_center_director` 订单。
    /// reject 必须携带原因，approve 不得携带。
    pub async fn decide(
        &self,
        actor: &CurrentUser,
        order_id: &str,
        decision: Decision,
        reason: Option<String>,
    ) -> AppResult<Order> {
        let reason = match (decision, reason) {
            (Decision::Reject, Some(r)) if !r.trim().is_empty() => Some(r),
            (Decision::Reject, _) => {
                return Err(AppError::validation(
                    "A rejection requires a reason".to_string(),
                ));
            }
            (Decision::Approve, Some(_)) => {
                return Err(AppError::validation(
                    "An approval must not carry a rejection reason".to_string(),
                ));
            }
            (Decision::Approve, None) => None,
        };

        let order = self.orders.get(order_id).await?;

        // 部门范围鉴权 (角色与阶段的匹配交给状态机表)
        if actor.role == Role::TeamLeader
            && actor.department_id.as_deref() != Some(order.department_id.as_str())
        {
            return Err(AppError::forbidden(format!(
                "Order {} belongs to another department",
                order_id
            )));
        }

        let target = workflow::decide_target(order.status, actor.role, decision)?;

        let applied = match &reason {
            Some(reason) => self.orders.reject(order_id, order.status, reason).await?,
            None => self.orders.advance_status(order_id, order.status, target).await?,
        };
        if !applied {
            // 条件更新未命中：另一个审批在本次读取后先行生效
            return Err(AppError::invalid_transition(format!(
                "Order {} was decided concurrently",
                order_id
            )));
        }

        tracing::info!(
            order_id = %order_id,
            actor = %actor.username,
            decision = ?decision,
            target = %target,
            "Order decided"
        );
        Ok(self.orders.get(order_id).await?)
    }

    /// 团队领导进度视图：本部门已上报的订单 (待审 + 已流转 + 终态)
    pub async fn team_leader_progress(
        &self,
        actor: &CurrentUser,
    ) -> AppResult<Vec<OrderSummary>> {
        let department = actor.supervised_department()?;
        let scope = OrderScope {
            owner_id: None,
            department_id: Some(department.to_string()),
            statuses: Some(vec![
                OrderStatus::PendingTeamLeader,
                OrderStatus::PendingCenterDirector,
                OrderStatus::Approved,
                OrderStatus::Rejected,
            ]),
        };
        Ok(self.orders.list(&scope).await?)
    }

    /// 中心主任进度视图：全部门已转呈的订单 (待终审 + 终态)
    pub async fn center_director_progress(
        &self,
        actor: &CurrentUser,
    ) -> AppResult<Vec<OrderSummary>> {
        if actor.role != Role::CenterDirector {
            return Err(AppError::forbidden(
                "Center director role required".to_string(),
            ));
        }
        let scope = OrderScope {
            owner_id: None,
            department_id: None,
            statuses: Some(vec![
                OrderStatus::PendingCenterDirector,
                OrderStatus::Approved,
                OrderStatus::Rejected,
            ]),
        };
        Ok(self.orders.list(&scope).await?)
    }
}
