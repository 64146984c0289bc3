//! Issues API 模块

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/issues", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        // Static routes before /{id} to avoid path conflicts
        .route("/mine", get(handler::mine))
        .route("/stats", get(handler::stats))
        .route("/user/{email}", get(handler::by_user))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/assign", post(handler::assign))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/undo-reject", post(handler::undo_reject))
        .route("/{id}/upvote", post(handler::upvote))
        .route("/{id}/can-upvote", get(handler::can_upvote))
        .route("/{id}/permissions", get(handler::permissions))
}
