#![allow(dead_code)]

use payswitch::application::{BreakerRegistry, BreakerSettings, PaymentOrchestrator};
use payswitch::domain::routing::RoutingTable;
use payswitch::infrastructure::gateway::{DefaultGatewayFactory, GatewayEndpoints};
use payswitch::infrastructure::in_memory::InMemoryLedger;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PGB_PREFIX: &str = "/soap";

pub fn soap_reply(action: &str, status: &str) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <ns2:{action}Response xmlns:ns2="http://pgsb.com/">
      <return>
        <status>{status}</status>
        <message>PGB {action} {status}</message>
      </return>
    </ns2:{action}Response>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

/// PGA answers every call to `action` with `status`.
pub async fn mount_pga(server: &MockServer, action: &str, status: u16, expected_calls: u64) {
    let body = if status < 300 {
        json!({"status": "success", "message": "PGA accepted"})
    } else {
        json!({"status": "error", "message": "Internal Server Error"})
    };
    Mock::given(method("POST"))
        .and(path(format!("/{action}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// PGB answers every call to `action` with `status`.
pub async fn mount_pgb(server: &MockServer, action: &str, status: u16, expected_calls: u64) {
    let template = if status < 300 {
        ResponseTemplate::new(status).set_body_string(soap_reply(action, "success"))
    } else {
        ResponseTemplate::new(status).set_body_string("<fault>down</fault>")
    };
    Mock::given(method("POST"))
        .and(path(format!("{PGB_PREFIX}/{action}")))
        .respond_with(template)
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub struct Harness {
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub ledger: Arc<InMemoryLedger>,
}

pub fn harness(pga: &MockServer, pgb: &MockServer, settings: BreakerSettings) -> Harness {
    harness_with_routing(pga, pgb, settings, RoutingTable::default())
}

pub fn harness_with_routing(
    pga: &MockServer,
    pgb: &MockServer,
    settings: BreakerSettings,
    routing: RoutingTable,
) -> Harness {
    let endpoints = GatewayEndpoints {
        pga: pga.uri().parse().unwrap(),
        pgb: format!("{}{PGB_PREFIX}", pgb.uri()).parse().unwrap(),
    };
    let factory = DefaultGatewayFactory::new(&endpoints, Some(Duration::from_secs(5))).unwrap();
    let ledger = Arc::new(InMemoryLedger::new());
    let orchestrator = PaymentOrchestrator::new(
        ledger.clone(),
        Arc::new(factory),
        BreakerRegistry::new(settings),
        routing,
        ["USD", "EUR", "GBP", "INR"].map(String::from),
    );
    Harness {
        orchestrator: Arc::new(orchestrator),
        ledger,
    }
}

/// Breaker settings with a short cooldown so tests can wait it out.
pub fn fast_breaker() -> BreakerSettings {
    BreakerSettings {
        interval: Duration::from_secs(60),
        cooldown: Duration::from_millis(200),
        ..BreakerSettings::default()
    }
}
