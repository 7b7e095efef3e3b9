//! Database Models
//!
//! SQLite 表结构对应的模型与请求/响应载荷

mod department;
mod member;
mod order;

pub use department::{Department, DepartmentInfo, MemberBrief};
pub use member::{Member, Role};
pub use order::{
    Decision, Order, OrderCreate, OrderDetail, OrderStatus, OrderSummary, OrderUpdate,
};
