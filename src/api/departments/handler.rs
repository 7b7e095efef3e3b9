//! Department API Handlers
//!
//! 目录信息与角色范围查询 (筛选下拉框 + 详情列表)

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::api::orders::parse_statuses;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{DepartmentInfo, OrderSummary};
use crate::services::QueryService;
use crate::utils::AppResult;
use crate::workflow::OrderFilter;

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    pub department: Option<String>,
    pub member: Option<String>,
    pub status: Option<String>,
}

/// Directory info for filter dropdowns (team leader: own department;
/// center director: all departments)
pub async fn info(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<DepartmentInfo>>> {
    let service = QueryService::new(state.get_db());
    let infos = service.department_info(&user).await?;
    Ok(Json(infos))
}

/// Role-scoped order listing with optional department/member/status filters
pub async fn details(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<DetailsQuery>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let filter = OrderFilter {
        department_id: query.department,
        member_id: query.member,
        statuses: parse_statuses(query.status.as_deref())?,
    };
    let service = QueryService::new(state.get_db());
    let orders = service.list_orders(&user, filter).await?;
    Ok(Json(orders))
}
