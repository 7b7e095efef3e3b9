//! 认证模块 - JWT + Argon2
//!
//! - [`JwtService`] - 令牌生成与验证
//! - [`CurrentUser`] - 请求上下文中的当前成员
//! - [`middleware::require_auth`] - 认证中间件

mod extractor;
mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
