//! Order API Handlers
//!
//! 订单创建/查询/修改/删除与批量上报。创建和修改接收 multipart：
//! `request` 部分为 JSON 载荷，`image` 部分为可选附件。

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderCreate, OrderDetail, OrderStatus, OrderSummary, OrderUpdate};
use crate::services::OrderService;
use crate::utils::{AppError, AppResult};

fn order_service(state: &ServerState) -> OrderService {
    OrderService::new(state.get_db(), state.image_store.clone())
}

/// 解析逗号分隔的状态列表 (`?status=approved,rejected`)
pub(crate) fn parse_statuses(raw: Option<&str>) -> AppResult<Option<Vec<OrderStatus>>> {
    let Some(raw) = raw else { return Ok(None) };
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let status = OrderStatus::parse(part)
            .ok_or_else(|| AppError::validation(format!("Unknown status '{}'", part)))?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(if statuses.is_empty() { None } else { Some(statuses) })
}

/// 读取 multipart 的 `request` (JSON) 和可选 `image` 部分
async fn read_parts<T: DeserializeOwned>(
    multipart: &mut Multipart,
) -> AppResult<(T, Option<Vec<u8>>)> {
    let mut request: Option<T> = None;
    let mut image: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("request") => {
                let bytes = field.bytes().await?;
                request = Some(serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::validation(format!("Invalid request payload: {}", e))
                })?);
            }
            Some("image") => {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    image = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    let request = request
        .ok_or_else(|| AppError::validation("Missing 'request' part".to_string()))?;
    Ok((request, image))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub order_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submitted: usize,
}

/// Create a draft order (multipart: `request` + optional `image`)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<Order>> {
    let (payload, image) = read_parts::<OrderCreate>(&mut multipart).await?;
    let order = order_service(&state).create(&user, payload, image).await?;
    Ok(Json(order))
}

/// List own orders, optional status-set filter
pub async fn list_mine(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<Vec<OrderSummary>>> {
    let statuses = parse_statuses(query.status.as_deref())?;
    let orders = order_service(&state).my_orders(&user, statuses).await?;
    Ok(Json(orders))
}

/// Order detail
pub async fn detail(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let detail = order_service(&state).detail(&user, &order_id).await?;
    Ok(Json(detail))
}

/// Order image (inline JPEG)
pub async fn image(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Response> {
    let bytes = order_service(&state).image(&user, &order_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}.jpg\"", order_id),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Update a draft order (multipart: `request` + optional replacement `image`)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<Order>> {
    let (payload, image) = read_parts::<OrderUpdate>(&mut multipart).await?;
    let order = order_service(&state)
        .update(&user, &order_id, payload, image)
        .await?;
    Ok(Json(order))
}

/// Delete a draft order
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<bool>> {
    order_service(&state).delete(&user, &order_id).await?;
    Ok(Json(true))
}

/// Submit a batch of drafts one stage forward (all-or-nothing)
pub async fn submit(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<SubmitRequest>,
) -> AppResult<Json<SubmitResponse>> {
    let submitted = order_service(&state).submit(&user, &req.order_ids).await?;
    Ok(Json(SubmitResponse { submitted }))
}
