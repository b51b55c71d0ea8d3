mod common;

use common::{fast_breaker, harness, mount_pga, mount_pgb};
use payswitch::application::BreakerState;
use payswitch::domain::payment::{Action, PaymentRequest};
use payswitch::domain::ports::PaymentService;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn deposit() -> PaymentRequest {
    PaymentRequest::new(Action::Deposit, "u1", "USD", 100)
}

#[tokio::test]
async fn test_open_breaker_skips_provider_until_cooldown() {
    let pga = MockServer::start().await;
    let pgb = MockServer::start().await;
    // three calls trip the breaker, one more is the half-open trial
    mount_pga(&pga, "deposit", 500, 4).await;
    mount_pgb(&pgb, "deposit", 200, 5).await;

    let h = harness(&pga, &pgb, fast_breaker());
    for _ in 0..3 {
        h.orchestrator.deposit(deposit()).await.unwrap();
    }
    let breaker = h.orchestrator.breakers().get("PGA").unwrap();
    assert_eq!(breaker.state(), BreakerState::Open);

    // skipped without touching PGA
    h.orchestrator.deposit(deposit()).await.unwrap();
    assert_eq!(pga.received_requests().await.unwrap().len(), 3);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(breaker.state(), BreakerState::HalfOpen);

    // the failed trial reopens the breaker
    h.orchestrator.deposit(deposit()).await.unwrap();
    assert_eq!(breaker.state(), BreakerState::Open);
}

#[tokio::test]
async fn test_successful_trial_closes_breaker() {
    let pga = MockServer::start().await;
    let pgb = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deposit"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&pga)
        .await;
    Mock::given(method("POST"))
        .and(path("/deposit"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "success", "message": "PGA accepted"})),
        )
        .expect(2)
        .mount(&pga)
        .await;
    mount_pgb(&pgb, "deposit", 200, 4).await;

    let h = harness(&pga, &pgb, fast_breaker());
    for _ in 0..4 {
        h.orchestrator.deposit(deposit()).await.unwrap();
    }
    let breaker = h.orchestrator.breakers().get("PGA").unwrap();
    assert_eq!(breaker.state(), BreakerState::Open);

    tokio::time::sleep(Duration::from_millis(250)).await;
    let trial = h.orchestrator.deposit(deposit()).await.unwrap();
    assert_eq!(trial.message, "PGA accepted");
    assert_eq!(breaker.state(), BreakerState::Closed);

    let next = h.orchestrator.deposit(deposit()).await.unwrap();
    assert_eq!(next.message, "PGA accepted");
}

#[tokio::test]
async fn test_breakers_are_tracked_per_provider() {
    let pga = MockServer::start().await;
    let pgb = MockServer::start().await;
    mount_pga(&pga, "deposit", 500, 3).await;
    mount_pgb(&pgb, "deposit", 200, 3).await;

    let h = harness(&pga, &pgb, fast_breaker());
    for _ in 0..3 {
        h.orchestrator.deposit(deposit()).await.unwrap();
    }

    let breakers = h.orchestrator.breakers();
    assert_eq!(breakers.len(), 2);
    assert_eq!(breakers.get("PGA").unwrap().state(), BreakerState::Open);
    assert_eq!(breakers.get("PGB").unwrap().state(), BreakerState::Closed);
}
