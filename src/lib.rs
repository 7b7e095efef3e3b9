//! Approval Server - 部门订单审批后端
//!
//! # 架构概述
//!
//! 提供部门内部订单上报与两级审批的 HTTP 后端：
//!
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **数据库** (`db`): 嵌入式 SQLite 存储 (sqlx)
//! - **审批流** (`workflow`): 状态机转移与角色范围解析
//! - **业务服务** (`services`): 订单、审批、查询、图片存储
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、用户上下文
//! ├── workflow/      # 状态机、角色范围
//! ├── services/      # 订单、审批、查询、图片
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (模型 + 仓储)
//! └── utils/         # 错误、日志、工具函数
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;
pub mod workflow;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
    ___                                   __
   /   |  ____  ____  _________ _   ______ _/ /
  / /| | / __ \/ __ \/ ___/ __ \ | / / __ `/ /
 / ___ |/ /_/ / /_/ / /  / /_/ / |/ / /_/ / /
/_/  |_/ .___/ .___/_/   \____/|___/\__,_/_/
      /_/   /_/
    "#
    );
}
