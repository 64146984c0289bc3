//! Payments API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create_subscription))
        .route("/boost", post(handler::create_boost))
        .route("/user/{email}", get(handler::by_payer))
}
