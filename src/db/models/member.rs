//! Member Model
//!
//! 目录服务中的成员记录。工作流只读取成员信息用于鉴权和范围裁剪，
//! 不提供任何成员/部门的写接口。

use serde::{Deserialize, Serialize};

/// 成员角色
///
/// 审批流水线的三个角色：
/// - `Employee` - 普通员工，只能操作自己的订单
/// - `TeamLeader` - 团队领导，负责本部门的一级审批
/// - `CenterDirector` - 中心主任，跨部门的终审角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Employee,
    TeamLeader,
    CenterDirector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::TeamLeader => "team_leader",
            Role::CenterDirector => "center_director",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member model matching the SQLite schema
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub hash_pass: String,
    pub role: Role,
    /// 中心主任无所属部门
    pub department_id: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

impl Member {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.hash_pass)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}
