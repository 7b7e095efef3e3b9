//! 服务层
//!
//! 处理器之下、仓储之上的业务服务：
//!
//! - [`OrderService`] - 订单 CRUD、附件生命周期、批量上报
//! - [`ApprovalService`] - 审批决定、进度视图
//! - [`QueryService`] - 角色范围查询、目录信息
//! - [`ImageStore`] - 附件图片存储

mod approval_service;
mod image_store;
mod order_service;
mod query_service;

pub use approval_service::ApprovalService;
pub use image_store::ImageStore;
pub use order_service::OrderService;
pub use query_service::QueryService;
