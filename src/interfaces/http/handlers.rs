use super::AppState;
use crate::domain::payment::{Action, CallbackRequest, PaymentRequest};
use crate::error::PaymentError;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

/// Body accepted by `/deposit` and `/withdraw`.
#[derive(Debug, Deserialize)]
pub struct PaymentBody {
    #[serde(default, rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub exponent: u32,
    #[serde(default)]
    pub country_code: String,
}

impl PaymentBody {
    fn into_request(self, action: Action) -> PaymentRequest {
        PaymentRequest::new(action, self.user_id, self.currency, self.amount)
            .with_exponent(self.exponent)
            .with_country_code(self.country_code)
    }
}

fn bad_request(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"message": "Bad Request", "details": rejection.body_text()})),
    )
        .into_response()
}

fn payment_failure(err: PaymentError) -> Response {
    match err {
        PaymentError::Validation(cause) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Validation failed", "details": cause})),
        )
            .into_response(),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to process request", "details": other.to_string()})),
        )
            .into_response(),
    }
}

async fn route_payment(
    state: AppState,
    body: Result<Json<PaymentBody>, JsonRejection>,
    action: Action,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };
    let request = body.into_request(action);

    let result = match action {
        Action::Deposit => state.payments.deposit(request).await,
        Action::Withdraw => state.payments.withdraw(request).await,
    };
    match result {
        Ok(response) => (StatusCode::ACCEPTED, Json(response)).into_response(),
        Err(e) => {
            tracing::warn!(%action, error = %e, "payment request rejected");
            payment_failure(e)
        }
    }
}

pub async fn deposit(
    State(state): State<AppState>,
    body: Result<Json<PaymentBody>, JsonRejection>,
) -> Response {
    route_payment(state, body, Action::Deposit).await
}

pub async fn withdraw(
    State(state): State<AppState>,
    body: Result<Json<PaymentBody>, JsonRejection>,
) -> Response {
    route_payment(state, body, Action::Withdraw).await
}

pub async fn callback(
    State(state): State<AppState>,
    body: Result<Json<CallbackRequest>, JsonRejection>,
) -> Response {
    let Json(callback) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection),
    };

    match state.payments.handle_callback(callback).await {
        Ok(_) => (StatusCode::OK, Json(json!({"status": "ok"}))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "settlement callback failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Error", "details": e.to_string()})),
            )
                .into_response()
        }
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
