//! Member Repository
//!
//! 成员目录的读取，以及首次启动时的引导账号写入。
//! 除引导流程外，工作流不修改成员数据。

use super::{RepoError, RepoResult};
use crate::db::models::{Member, Role};
use crate::utils::now_millis;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

const SELECT_COLS: &str =
    "id, username, display_name, hash_pass, role, department_id, is_active, created_at";

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find member by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {SELECT_COLS} FROM member WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    /// Find member by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {SELECT_COLS} FROM member WHERE username = ? LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    /// Find all active members of a department, ordered by name
    pub async fn find_by_department(&self, department_id: &str) -> RepoResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {SELECT_COLS} FROM member WHERE department_id = ? AND is_active = 1 ORDER BY display_name"
        ))
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Count all members (bootstrap check)
    pub async fn count(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM member")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create a member (bootstrap / test fixtures only)
    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
        role: Role,
        department_id: Option<&str>,
    ) -> RepoResult<Member> {
        if self.find_by_username(username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' already exists",
                username
            )));
        }

        let hash_pass = Member::hash_password(password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let id = Uuid::new_v4().to_string();
        let now = now_millis();
        sqlx::query(
            "INSERT INTO member (id, username, display_name, hash_pass, role, department_id, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(display_name)
        .bind(&hash_pass)
        .bind(role)
        .bind(department_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| RepoError::Database("Failed to create member".to_string()))
    }
}
