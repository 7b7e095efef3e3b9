//! Approval API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Approval router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/approvals/{order_id}", post(handler::decide))
        .route("/api/progress", get(handler::progress))
}
