//! Users API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        // Static routes before /{email} to avoid path conflicts
        .route("/validate", post(handler::validate))
        .route("/role", post(handler::update_role))
        .route("/role/{email}", get(handler::check_role))
        .route("/{email}", get(handler::get_by_email).patch(handler::update))
}
