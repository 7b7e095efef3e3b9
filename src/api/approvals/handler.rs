//! Approval API Handlers
//!
//! 审批决定与进度视图。同一组接口按角色分派：
//! 团队领导作用于本部门一级审批，中心主任作用于终审。

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Decision, Order, OrderSummary, Role};
use crate::services::ApprovalService;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub decision: Decision,
    pub reason: Option<String>,
}

/// Approve or reject an order (role decides the stage)
pub async fn decide(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
    Json(req): Json<DecideRequest>,
) -> AppResult<Json<Order>> {
    let service = ApprovalService::new(state.get_db());
    let order = service
        .decide(&user, &order_id, req.decision, req.reason)
        .await?;
    Ok(Json(order))
}

/// Progress view, dispatched by role
///
/// 团队领导：本部门已上报订单；中心主任：全部门已转呈订单
pub async fn progress(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let service = ApprovalService::new(state.get_db());
    let orders = match user.role {
        Role::TeamLeader => service.team_leader_progress(&user).await?,
        Role::CenterDirector => service.center_director_progress(&user).await?,
        Role::Employee => {
            return Err(AppError::forbidden("Reviewer role required".to_string()));
        }
    };
    Ok(Json(orders))
}
