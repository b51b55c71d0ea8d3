//! JSON HTTP API.
//!
//! - `POST /deposit`, `POST /withdraw`: route a payment, `202` on acceptance
//! - `POST /callback`: settlement confirmation from a provider
//! - `GET /health`: liveness probe

pub mod handlers;

use crate::domain::ports::PaymentServiceRef;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub payments: PaymentServiceRef,
}

impl AppState {
    pub fn new(payments: PaymentServiceRef) -> Self {
        Self { payments }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/deposit", post(handlers::deposit))
        .route("/withdraw", post(handlers::withdraw))
        .route("/callback", post(handlers::callback))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
