//! Order Service
//!
//! 订单 CRUD 与批量上报。草稿只能由创建者修改/删除；
//! 上报在单个事务内整批校验，任何一单不合规则整批回滚。

use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db::models::{
    Order, OrderCreate, OrderDetail, OrderStatus, OrderSummary, OrderUpdate, Role,
};
use crate::db::repository::{DepartmentRepository, MemberRepository, OrderRepository};
use crate::services::ImageStore;
use crate::utils::{AppError, AppResult, now_millis};
use crate::workflow::{self, OrderScope};

pub struct OrderService {
    orders: OrderRepository,
    members: MemberRepository,
    departments: DepartmentRepository,
    images: ImageStore,
}

impl OrderService {
    pub fn new(pool: SqlitePool, images: ImageStore) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            departments: DepartmentRepository::new(pool),
            images,
        }
    }

    /// 创建草稿订单 (可选附件图片)
    ///
    /// 图片先落盘再写订单行；订单写入失败时回收已写入的图片。
    pub async fn create(
        &self,
        actor: &CurrentUser,
        payload: OrderCreate,
        image: Option<Vec<u8>>,
    ) -> AppResult<Order> {
        payload.validate()?;

        let department_id = match actor.role {
            Role::Employee | Role::TeamLeader => {
                actor.department_id.clone().ok_or_else(|| {
                    AppError::internal("Member account has no department")
                })?
            }
            Role::CenterDirector => {
                return Err(AppError::forbidden(
                    "Center director does not create orders".to_string(),
                ));
            }
        };

        let image_ref = match image {
            Some(bytes) => Some(self.images.store(&bytes)?),
            None => None,
        };

        let now = now_millis();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            owner_id: actor.id.clone(),
            department_id,
            item_name: payload.item_name,
            quantity: payload.quantity,
            price: payload.price,
            comment: payload.comment,
            image_ref: image_ref.clone(),
            status: OrderStatus::Draft,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.orders.create(&order).await {
            // 订单未落库，回收图片避免孤儿文件
            if let Some(image_ref) = &image_ref {
                let _ = self.images.delete(image_ref);
            }
            return Err(e.into());
        }

        tracing::info!(order_id = %order.id, owner = %actor.username, "Order draft created");
        Ok(order)
    }

    /// 订单详情 (含所有者/部门名称)
    pub async fn detail(&self, actor: &CurrentUser, order_id: &str) -> AppResult<OrderDetail> {
        let order = self.orders.get(order_id).await?;
        self.authorize_read(actor, &order)?;

        let owner = self
            .members
            .find_by_id(&order.owner_id)
            .await?
            .ok_or_else(|| AppError::internal("Order owner missing from directory"))?;
        let department = self
            .departments
            .find_by_id(&order.department_id)
            .await?
            .ok_or_else(|| AppError::internal("Order department missing from directory"))?;

        Ok(OrderDetail {
            order,
            owner_name: owner.display_name,
            department_name: department.name,
        })
    }

    /// 本人订单列表，可选状态集合筛选
    pub async fn my_orders(
        &self,
        actor: &CurrentUser,
        statuses: Option<Vec<OrderStatus>>,
    ) -> AppResult<Vec<OrderSummary>> {
        let scope = OrderScope {
            owner_id: Some(actor.id.clone()),
            department_id: None,
            statuses,
        };
        Ok(self.orders.list(&scope).await?)
    }

    /// 订单附件图片内容
    pub async fn image(&self, actor: &CurrentUser, order_id: &str) -> AppResult<Vec<u8>> {
        let order = self.orders.get(order_id).await?;
        self.authorize_read(actor, &order)?;

        let image_ref = order
            .image_ref
            .as_deref()
            .ok_or_else(|| AppError::not_found(format!("Order {} has no image", order_id)))?;
        self.images.fetch(image_ref)
    }

    /// 修改草稿 (创建者本人，仅 draft 状态)
    ///
    /// 新图片先落盘，行更新成功后再删除旧图片；
    /// 行更新失败时删除新图片，保持订单与附件一致。
    pub async fn update(
        &self,
        actor: &CurrentUser,
        order_id: &str,
        payload: OrderUpdate,
        image: Option<Vec<u8>>,
    ) -> AppResult<Order> {
        payload.validate()?;

        let order = self.orders.get(order_id).await?;
        if order.owner_id != actor.id {
            return Err(AppError::forbidden(
                "Only the creator can edit an order".to_string(),
            ));
        }
        if order.status != OrderStatus::Draft {
            return Err(AppError::invalid_transition(format!(
                "Order {} is not editable in status '{}'",
                order_id, order.status
            )));
        }

        let new_image_ref = match image {
            Some(bytes) => Some(self.images.store(&bytes)?),
            None => None,
        };

        let item_name = payload.item_name.unwrap_or(order.item_name);
        let quantity = payload.quantity.unwrap_or(order.quantity);
        let price = payload.price.unwrap_or(order.price);
        let comment = payload.comment.or(order.comment);
        let image_ref = new_image_ref.clone().or(order.image_ref.clone());

        let updated = match self
            .orders
            .update_draft(
                order_id,
                &actor.id,
                &item_name,
                quantity,
                price,
                comment.as_deref(),
                image_ref.as_deref(),
            )
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                // 行更新失败，订单仍指向旧图片，回收新图片避免孤儿文件
                if let Some(image_ref) = &new_image_ref {
                    let _ = self.images.delete(image_ref);
                }
                return Err(e.into());
            }
        };

        if !updated {
            // 条件更新未命中：订单在读取后被上报/删除
            if let Some(image_ref) = &new_image_ref {
                let _ = self.images.delete(image_ref);
            }
            return match self.orders.find_by_id(order_id).await? {
                None => Err(AppError::not_found(format!("Order {} not found", order_id))),
                Some(current) => Err(AppError::invalid_transition(format!(
                    "Order {} is not editable in status '{}'",
                    order_id, current.status
                ))),
            };
        }

        // 替换成功后回收旧图片
        if new_image_ref.is_some()
            && let Some(old_ref) = &order.image_ref
        {
            let _ = self.images.delete(old_ref);
        }

        Ok(self.orders.get(order_id).await?)
    }

    /// 删除草稿 (创建者本人，仅 draft 状态)；附件随订单一并删除
    pub async fn delete(&self, actor: &CurrentUser, order_id: &str) -> AppResult<()> {
        let order = self.orders.get(order_id).await?;
        if order.owner_id != actor.id {
            return Err(AppError::forbidden(
                "Only the creator can delete an order".to_string(),
            ));
        }
        if order.status != OrderStatus::Draft {
            return Err(AppError::invalid_transition(format!(
                "Order {} is not deletable in status '{}'",
                order_id, order.status
            )));
        }

        let deleted = self.orders.delete_draft(order_id, &actor.id).await?;
        if !deleted {
            return match self.orders.find_by_id(order_id).await? {
                None => Err(AppError::not_found(format!("Order {} not found", order_id))),
                Some(current) => Err(AppError::invalid_transition(format!(
                    "Order {} is not deletable in status '{}'",
                    order_id, current.status
                ))),
            };
        }

        if let Some(image_ref) = &order.image_ref {
            let _ = self.images.delete(image_ref);
        }

        tracing::info!(order_id = %order_id, owner = %actor.username, "Order draft deleted");
        Ok(())
    }

    /// 批量上报选中的草稿
    ///
    /// 整批要么全部推进一个阶段，要么一单未动：单个事务内逐单校验，
    /// 第一处不合规即回滚并报出违规的订单 ID。
    pub async fn submit(&self, actor: &CurrentUser, order_ids: &[String]) -> AppResult<usize> {
        if order_ids.is_empty() {
            return Err(AppError::validation("No orders selected".to_string()));
        }

        // 上报目标阶段由角色决定；非草稿在循环内逐单报错
        let target = workflow::submit_target(OrderStatus::Draft, actor.role)?;

        // set 语义：重复 ID 只处理一次
        let mut ids: Vec<&String> = Vec::with_capacity(order_ids.len());
        for id in order_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut tx = self
            .orders
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let now = now_millis();
        for id in &ids {
            let order = sqlx::query_as::<_, Order>(
                "SELECT id, owner_id, department_id, item_name, quantity, price, comment, \
                 image_ref, status, reject_reason, created_at, updated_at \
                 FROM orders WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;

            if order.owner_id != actor.id {
                return Err(AppError::forbidden(format!(
                    "Order {} does not belong to the submitter",
                    id
                )));
            }
            if order.status != OrderStatus::Draft {
                return Err(AppError::invalid_transition(format!(
                    "Order {} is not submittable in status '{}'",
                    id, order.status
                )));
            }

            let rows = sqlx::query(
                "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
            )
            .bind(target)
            .bind(now)
            .bind(id)
            .bind(OrderStatus::Draft)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

            if rows.rows_affected() != 1 {
                return Err(AppError::invalid_transition(format!(
                    "Order {} changed status during submission",
                    id
                )));
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit submission: {e}")))?;

        tracing::info!(
            count = ids.len(),
            submitter = %actor.username,
            target = %target,
            "Orders submitted"
        );
        Ok(ids.len())
    }

    /// 读权限：本人订单、团队领导的本部门订单、中心主任的全部订单
    fn authorize_read(&self, actor: &CurrentUser, order: &Order) -> AppResult<()> {
        let allowed = match actor.role {
            Role::Employee => order.owner_id == actor.id,
            Role::TeamLeader => {
                order.owner_id == actor.id
                    || actor.department_id.as_deref() == Some(order.department_id.as_str())
            }
            Role::CenterDirector => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Order {} is outside your scope",
                order.id
            )))
        }
    }
}
