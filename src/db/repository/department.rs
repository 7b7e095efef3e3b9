//! Department Repository
//!
//! 目录数据只读访问 (部门表由外部运维写入)

use super::RepoResult;
use crate::db::models::Department;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct DepartmentRepository {
    pool: SqlitePool,
}

impl DepartmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find all departments ordered by name
    pub async fn find_all(&self) -> RepoResult<Vec<Department>> {
        let departments = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM department ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    /// Create a department (provisioning / test fixtures only)
    pub async fn create(&self, name: &str) -> RepoResult<Department> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = crate::utils::now_millis();
        sqlx::query("INSERT INTO department (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await?;

        self.find_by_id(&id).await?.ok_or_else(|| {
            super::RepoError::Database("Failed to create department".to_string())
        })
    }

    /// Find department by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Department>> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM department WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }
}
