//! 当前成员提取器
//!
//! 所有 `/api` 受保护路由都先经过 [`require_auth`] 中间件，
//! 验证通过的 [`CurrentUser`] 已写入请求扩展；提取器只负责取出。
//! 扩展中没有用户说明路由没挂中间件或令牌未通过验证。
//!
//! [`require_auth`]: crate::auth::middleware::require_auth

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                Err(AppError::unauthorized())
            }
        }
    }
}
