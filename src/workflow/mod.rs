//! 审批工作流核心
//!
//! 与存储无关的纯逻辑层：
//!
//! - [`transition`] - 审批状态机表：(当前状态, 角色, 决定) → 下一状态
//! - [`scope`] - 角色范围裁剪：把调用方的筛选条件解析为有效查询范围
//!
//! 处理器和服务只通过这两个入口推进/查询订单，
//! 保证每一条状态边都可以在无数据库的情况下单测。

pub mod scope;
pub mod transition;

pub use scope::{OrderFilter, OrderScope, resolve_scope};
pub use transition::{decide_target, submit_target};

use crate::AppError;
use thiserror::Error;

/// Workflow rule violations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// 状态机拒绝的流转 (比如对终态订单重复审批)
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// 角色不允许执行该操作
    #[error("role not allowed: {0}")]
    RoleNotAllowed(String),

    /// 筛选条件/载荷非法
    #[error("validation: {0}")]
    Validation(String),
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::InvalidTransition(msg) => AppError::InvalidTransition(msg),
            WorkflowError::RoleNotAllowed(msg) => AppError::Forbidden(msg),
            WorkflowError::Validation(msg) => AppError::Validation(msg),
        }
    }
}
