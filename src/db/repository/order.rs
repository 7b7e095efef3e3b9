//! Order Repository
//!
//! 订单持久化。状态推进一律使用条件更新
//! (`UPDATE … WHERE id = ? AND status = ?`)，由 SQLite 序列化并发决策：
//! 同一订单上的两个并发操作只有一个能命中预期状态，另一个影响 0 行。

use super::{RepoError, RepoResult};
use crate::db::models::{Order, OrderStatus, OrderSummary};
use crate::utils::now_millis;
use crate::workflow::OrderScope;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const ORDER_COLS: &str = "id, owner_id, department_id, item_name, quantity, price, comment, \
                          image_ref, status, reject_reason, created_at, updated_at";

const SUMMARY_SELECT: &str = "SELECT o.id, o.item_name, o.quantity, o.price, o.status, \
     o.reject_reason, o.owner_id, m.display_name AS owner_name, o.department_id, \
     d.name AS department_name, o.image_ref IS NOT NULL AS has_image, \
     o.created_at, o.updated_at \
     FROM orders o \
     JOIN member m ON m.id = o.owner_id \
     JOIN department d ON d.id = o.department_id";

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new draft order
    pub async fn create(&self, order: &Order) -> RepoResult<()> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&order.id)
        .bind(&order.owner_id)
        .bind(&order.department_id)
        .bind(&order.item_name)
        .bind(order.quantity)
        .bind(order.price)
        .bind(&order.comment)
        .bind(&order.image_ref)
        .bind(order.status)
        .bind(&order.reject_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// Find order by id, `NotFound` if missing
    pub async fn get(&self, id: &str) -> RepoResult<Order> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// List order summaries within a resolved scope, most recently updated first
    pub async fn list(&self, scope: &OrderScope) -> RepoResult<Vec<OrderSummary>> {
        let mut sql = String::from(SUMMARY_SELECT);
        let mut clauses: Vec<String> = Vec::new();

        if scope.owner_id.is_some() {
            clauses.push("o.owner_id = ?".to_string());
        }
        if scope.department_id.is_some() {
            clauses.push("o.department_id = ?".to_string());
        }
        if let Some(statuses) = &scope.statuses {
            if statuses.is_empty() {
                return Ok(vec![]);
            }
            let placeholders = statuses.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            clauses.push(format!("o.status IN ({placeholders})"));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY o.updated_at DESC, o.id");

        let mut query = sqlx::query_as::<_, OrderSummary>(&sql);
        if let Some(owner_id) = &scope.owner_id {
            query = query.bind(owner_id);
        }
        if let Some(department_id) = &scope.department_id {
            query = query.bind(department_id);
        }
        if let Some(statuses) = &scope.statuses {
            for status in statuses {
                query = query.bind(*status);
            }
        }

        let summaries = query.fetch_all(&self.pool).await?;
        Ok(summaries)
    }

    /// Advance order status, conditioned on the expected current status.
    /// Returns false when the order is no longer in `from` (lost race or stale client).
    pub async fn advance_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<bool> {
        let rows = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(to)
        .bind(now_millis())
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(rows.rows_affected() == 1)
    }

    /// Reject an order with a reason, conditioned on the expected current status
    pub async fn reject(&self, id: &str, from: OrderStatus, reason: &str) -> RepoResult<bool> {
        let rows = sqlx::query(
            "UPDATE orders SET status = ?, reject_reason = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(OrderStatus::Rejected)
        .bind(reason)
        .bind(now_millis())
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;
        Ok(rows.rows_affected() == 1)
    }

    /// Update a draft's content fields, conditioned on draft status and ownership.
    /// `image_ref` is the full replacement value (None clears it).
    pub async fn update_draft(
        &self,
        id: &str,
        owner_id: &str,
        item_name: &str,
        quantity: i64,
        price: i64,
        comment: Option<&str>,
        image_ref: Option<&str>,
    ) -> RepoResult<bool> {
        let rows = sqlx::query(
            "UPDATE orders SET item_name = ?, quantity = ?, price = ?, comment = ?, \
             image_ref = ?, updated_at = ? \
             WHERE id = ? AND owner_id = ? AND status = ?",
        )
        .bind(item_name)
        .bind(quantity)
        .bind(price)
        .bind(comment)
        .bind(image_ref)
        .bind(now_millis())
        .bind(id)
        .bind(owner_id)
        .bind(OrderStatus::Draft)
        .execute(&self.pool)
        .await?;
        Ok(rows.rows_affected() == 1)
    }

    /// Delete a draft, conditioned on draft status and ownership
    pub async fn delete_draft(&self, id: &str, owner_id: &str) -> RepoResult<bool> {
        let rows = sqlx::query("DELETE FROM orders WHERE id = ? AND owner_id = ? AND status = ?")
            .bind(id)
            .bind(owner_id)
            .bind(OrderStatus::Draft)
            .execute(&self.pool)
            .await?;
        Ok(rows.rows_affected() == 1)
    }
}
