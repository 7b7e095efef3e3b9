//! Department Model

use serde::{Deserialize, Serialize};

/// 部门记录 (目录数据，工作流只读)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// 部门 + 成员列表，用于前端筛选下拉框
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentInfo {
    pub department_id: String,
    pub department_name: String,
    pub members: Vec<MemberBrief>,
}

/// 成员摘要 (下拉框选项)
#[derive(Debug, Clone, Serialize)]
pub struct MemberBrief {
    pub member_id: String,
    pub member_name: String,
}
