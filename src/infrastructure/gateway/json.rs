use super::HttpTransport;
use crate::domain::payment::{Action, PaymentRequest, PaymentResponse};
use crate::domain::ports::PaymentGateway;
use crate::domain::routing::ProviderId;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CONTENT_TYPE_JSON: &str = "application/json";

/// Request body sent to PGA.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PgaRequest<'a> {
    transaction_id: &'a str,
    user_id: &'a str,
    currency: &'a str,
    amount: i64,
    exponent: u32,
    #[serde(rename = "country_code")]
    country_code: &'a str,
    r#type: Action,
}

impl<'a> From<&'a PaymentRequest> for PgaRequest<'a> {
    fn from(request: &'a PaymentRequest) -> Self {
        Self {
            transaction_id: request.transaction_id(),
            user_id: &request.user_id,
            currency: &request.currency,
            amount: request.amount,
            exponent: request.exponent,
            country_code: &request.country_code,
            r#type: request.action,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PgaReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Adapter for PGA, which takes JSON documents over HTTP.
pub struct JsonGateway {
    transport: HttpTransport,
}

impl JsonGateway {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    async fn process(&self, request: &PaymentRequest, action: Action) -> Result<PaymentResponse> {
        let body = serde_json::to_string(&PgaRequest::from(request))
            .map_err(|e| PaymentError::Encoding(format!("PGA request: {e}")))?;
        tracing::debug!(provider = "PGA", %action, request = %body, "sending request");

        let reply = self.transport.post(action, CONTENT_TYPE_JSON, body).await?;
        tracing::debug!(
            provider = "PGA",
            %action,
            response = %String::from_utf8_lossy(&reply),
            "received response"
        );

        let decoded: PgaReply = serde_json::from_slice(&reply).map_err(|e| {
            PaymentError::GatewayResponse(format!(
                "undecodable PGA body ({e}): {}",
                String::from_utf8_lossy(&reply)
            ))
        })?;

        Ok(PaymentResponse {
            status: decoded.status,
            message: decoded.message,
            transaction_id: request.transaction_id.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for JsonGateway {
    fn provider(&self) -> ProviderId {
        ProviderId::Pga
    }

    async fn deposit(&self, request: &PaymentRequest) -> Result<PaymentResponse> {
        self.process(request, Action::Deposit).await
    }

    async fn withdraw(&self, request: &PaymentRequest) -> Result<PaymentResponse> {
        self.process(request, Action::Withdraw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use serde_json::{Value, json};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> JsonGateway {
        JsonGateway::new(HttpTransport::new(
            Client::new(),
            &server.uri().parse().unwrap(),
        ))
    }

    fn request() -> PaymentRequest {
        let mut request = PaymentRequest::new(Action::Withdraw, "u1", "USD", 2500)
            .with_exponent(2)
            .with_country_code("US");
        request.transaction_id = Some("t-42".to_string());
        request
    }

    #[tokio::test]
    async fn test_withdraw_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/withdraw"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "success", "message": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = gateway(&server).withdraw(&request()).await.unwrap();
        assert_eq!(response.status, "success");
        assert_eq!(response.message, "queued");
        assert_eq!(response.transaction_id.as_deref(), Some("t-42"));

        let received = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(sent["userId"], "u1");
        assert_eq!(sent["amount"], 2500);
        assert_eq!(sent["country_code"], "US");
        assert_eq!(sent["transactionId"], "t-42");
        assert_eq!(sent["type"], "withdraw");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deposit"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server).deposit(&request()).await.unwrap_err();
        assert!(matches!(err, PaymentError::GatewayResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/deposit"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"status": "error", "message": "Internal Server Error"})),
            )
            .mount(&server)
            .await;

        let err = gateway(&server).deposit(&request()).await.unwrap_err();
        assert!(matches!(err, PaymentError::GatewayResponse(_)));
    }
}
