//! 首次启动引导
//!
//! 成员目录由外部运维维护，但空目录会让系统无法登录。
//! 首次启动 (member 表为空) 时创建一个默认中心主任账号。

use sqlx::SqlitePool;

use crate::db::models::Role;
use crate::db::repository::MemberRepository;
use crate::utils::{AppError, AppResult};

/// 默认中心主任登录名 (可用 DIRECTOR_USERNAME 覆盖)
const DEFAULT_DIRECTOR_USERNAME: &str = "director";

/// 如果成员表为空，创建默认中心主任账号
///
/// 密码取 `DIRECTOR_PASSWORD` 环境变量；未设置时生成随机密码并在日志中
/// 打印一次 (之后无法再取回)。
pub async fn seed_default_director(pool: &SqlitePool) -> AppResult<()> {
    let members = MemberRepository::new(pool.clone());
    if members.count().await.map_err(AppError::from)? > 0 {
        return Ok(());
    }

    let username = std::env::var("DIRECTOR_USERNAME")
        .unwrap_or_else(|_| DEFAULT_DIRECTOR_USERNAME.to_string());
    let (password, generated) = match std::env::var("DIRECTOR_PASSWORD") {
        Ok(p) if !p.is_empty() => (p, false),
        _ => (uuid::Uuid::new_v4().simple().to_string(), true),
    };

    members
        .create(&username, "Center Director", &password, Role::CenterDirector, None)
        .await
        .map_err(AppError::from)?;

    if generated {
        tracing::warn!(
            username = %username,
            password = %password,
            "Created default center director with a generated password — change it"
        );
    } else {
        tracing::info!(username = %username, "Created default center director account");
    }
    Ok(())
}
