//! Outbound adapters for the payment service providers.
//!
//! Every adapter speaks HTTP through [`HttpTransport`], which keeps the
//! classification of failures in one place: anything that prevents a complete
//! response from arriving (including a body cut off mid-stream) is a
//! [`PaymentError::GatewayTransport`], a response that arrives with a non-2xx
//! status is a [`PaymentError::GatewayResponse`].

pub mod json;
pub mod soap;

use crate::domain::payment::Action;
use crate::domain::ports::{GatewayFactory, GatewayRef};
use crate::domain::routing::ProviderId;
use crate::error::{PaymentError, Result};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub use json::JsonGateway;
pub use soap::SoapGateway;

/// Shared HTTP plumbing for the provider adapters.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(client: Client, base_url: &Url) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, action: Action) -> String {
        format!("{}/{}", self.base_url, action.as_str())
    }

    /// POSTs `body` to the action endpoint and returns the raw response body
    /// of a 2xx answer.
    pub async fn post(&self, action: Action, content_type: &str, body: String) -> Result<Vec<u8>> {
        let url = self.endpoint(action);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| PaymentError::GatewayTransport(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PaymentError::GatewayTransport(format!("{url}: reading body: {e}")))?;

        if !status.is_success() {
            return Err(PaymentError::GatewayResponse(format!(
                "{url} answered {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(body.to_vec())
    }
}

/// Base URLs of the known providers.
#[derive(Clone, Debug)]
pub struct GatewayEndpoints {
    pub pga: Url,
    pub pgb: Url,
}

/// Builds the provider adapters once and hands out shared references.
pub struct DefaultGatewayFactory {
    pga: GatewayRef,
    pgb: GatewayRef,
}

impl DefaultGatewayFactory {
    /// Creates the factory with one HTTP client shared by every adapter.
    ///
    /// `timeout` bounds a single provider call; `None` lets a call block for
    /// as long as the provider takes.
    pub fn new(endpoints: &GatewayEndpoints, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PaymentError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            pga: Arc::new(JsonGateway::new(HttpTransport::new(
                client.clone(),
                &endpoints.pga,
            ))),
            pgb: Arc::new(SoapGateway::new(HttpTransport::new(client, &endpoints.pgb))),
        })
    }
}

impl GatewayFactory for DefaultGatewayFactory {
    fn resolve(&self, provider: &str) -> Result<GatewayRef> {
        let gateway = match provider.parse::<ProviderId>()? {
            ProviderId::Pga => &self.pga,
            ProviderId::Pgb => &self.pgb,
        };
        Ok(Arc::clone(gateway))
    }
}
