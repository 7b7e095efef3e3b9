//! Query Service
//!
//! 角色范围内的订单查询与目录信息。范围裁剪本身是纯逻辑
//! ([`workflow::resolve_scope`])；这里补上需要目录数据的校验
//! (member/department 筛选对象是否存在、是否在团队领导辖内)。

use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::db::models::{DepartmentInfo, MemberBrief, OrderSummary, Role};
use crate::db::repository::{DepartmentRepository, MemberRepository, OrderRepository};
use crate::utils::{AppError, AppResult};
use crate::workflow::{self, OrderFilter};

pub struct QueryService {
    orders: OrderRepository,
    members: MemberRepository,
    departments: DepartmentRepository,
}

impl QueryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            departments: DepartmentRepository::new(pool),
        }
    }

    /// 角色范围内的订单列表
    ///
    /// 员工固定本人；团队领导固定本部门，member 筛选限本部门成员；
    /// 中心主任可按部门/成员/状态任意组合收窄。
    pub async fn list_orders(
        &self,
        actor: &CurrentUser,
        filter: OrderFilter,
    ) -> AppResult<Vec<OrderSummary>> {
        // 先按角色裁剪范围：越权的筛选条件在这里就被拒绝，
        // 不会泄露筛选对象是否存在
        let scope = workflow::resolve_scope(
            actor.role,
            &actor.id,
            actor.department_id.as_deref(),
            filter.clone(),
        )?;

        // 范围合法后，筛选对象必须真实存在，未知 ID 报 NotFound
        if let Some(department_id) = &filter.department_id
            && self.departments.find_by_id(department_id).await?.is_none()
        {
            return Err(AppError::not_found(format!(
                "Department {} not found",
                department_id
            )));
        }
        if let Some(member_id) = &filter.member_id {
            let member = self
                .members
                .find_by_id(member_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Member {} not found", member_id)))?;

            // 团队领导只能筛选本部门成员
            if actor.role == Role::TeamLeader
                && member.department_id.as_deref() != actor.department_id.as_deref()
            {
                return Err(AppError::forbidden(format!(
                    "Member {} is outside your department",
                    member_id
                )));
            }
        }

        Ok(self.orders.list(&scope).await?)
    }

    /// 目录信息：部门 + 成员列表，用于填充筛选下拉框
    ///
    /// 团队领导得到本部门的单元素列表，中心主任得到全部部门。
    pub async fn department_info(&self, actor: &CurrentUser) -> AppResult<Vec<DepartmentInfo>> {
        match actor.role {
            Role::Employee => Err(AppError::forbidden(
                "Reviewer role required".to_string(),
            )),
            Role::TeamLeader => {
                let department_id = actor.supervised_department()?;
                let department = self
                    .departments
                    .find_by_id(department_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Department {} not found", department_id))
                    })?;
                Ok(vec![self.build_info(department.id, department.name).await?])
            }
            Role::CenterDirector => {
                let departments = self.departments.find_all().await?;
                let mut infos = Vec::with_capacity(departments.len());
                for department in departments {
                    infos.push(self.build_info(department.id, department.name).await?);
                }
                Ok(infos)
            }
        }
    }

    async fn build_info(&self, id: String, name: String) -> AppResult<DepartmentInfo> {
        let members = self
            .members
            .find_by_department(&id)
            .await?
            .into_iter()
            .map(|m| MemberBrief {
                member_id: m.id,
                member_name: m.display_name,
            })
            .collect();
        Ok(DepartmentInfo {
            department_id: id,
            department_name: name,
            members,
        })
    }
}
