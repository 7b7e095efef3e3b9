//! Order API Module

mod handler;

pub(crate) use handler::parse_statuses;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_mine))
        .route("/submit", post(handler::submit))
        .route(
            "/{id}",
            get(handler::detail)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/image", get(handler::image))
}
