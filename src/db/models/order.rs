//! Order Model
//!
//! 订单及其审批状态。状态只沿流水线单向推进：
//!
//! ```text
//! draft → pending_team_leader → pending_center_director → approved | rejected
//! ```
//!
//! `approved` 和 `rejected` 为终态，不允许任何后续流转。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 订单审批状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    PendingTeamLeader,
    PendingCenterDirector,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingTeamLeader => "pending_team_leader",
            OrderStatus::PendingCenterDirector => "pending_center_director",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// 从查询参数解析状态名
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "draft" => Some(OrderStatus::Draft),
            "pending_team_leader" => Some(OrderStatus::PendingTeamLeader),
            "pending_center_director" => Some(OrderStatus::PendingCenterDirector),
            "approved" => Some(OrderStatus::Approved),
            "rejected" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// 终态订单不允许任何流转
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Rejected)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审批决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

/// Order model matching the SQLite schema
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub owner_id: String,
    pub department_id: String,
    pub item_name: String,
    pub quantity: i64,
    pub price: i64,
    pub comment: Option<String>,
    pub image_ref: Option<String>,
    pub status: OrderStatus,
    pub reject_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create order payload (multipart `request` part)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1, max = 200))]
    pub item_name: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(range(min = 0))]
    pub price: i64,
    pub comment: Option<String>,
}

/// Update order payload — 只允许草稿状态下由创建者修改
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderUpdate {
    #[validate(length(min = 1, max = 200))]
    pub item_name: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    pub comment: Option<String>,
}

/// 订单摘要 (列表/进度视图，关联了所有者和部门名称)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: String,
    pub item_name: String,
    pub quantity: i64,
    pub price: i64,
    pub status: OrderStatus,
    pub reject_reason: Option<String>,
    pub owner_id: String,
    pub owner_name: String,
    pub department_id: String,
    pub department_name: String,
    pub has_image: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 订单详情
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub owner_name: String,
    pub department_name: String,
}
