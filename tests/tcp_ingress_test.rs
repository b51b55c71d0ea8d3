mod common;

use common::{harness, mount_pga};
use payswitch::application::BreakerSettings;
use payswitch::domain::ports::PaymentServiceRef;
use payswitch::interfaces::tcp::{
    DelimitedFrameParser, REPLY_FAILURE, REPLY_SUCCESS, TcpIngress,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

async fn start(payments: PaymentServiceRef, token: CancellationToken) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let ingress = Arc::new(TcpIngress::new(
        payments,
        Arc::new(DelimitedFrameParser),
        "USD",
    ));
    (addr, tokio::spawn(ingress.serve(listener, token)))
}

async fn exchange(addr: SocketAddr, frame: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(frame).await.unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

#[tokio::test]
async fn test_frame_becomes_usd_deposit() {
    let pga = MockServer::start().await;
    let pgb = MockServer::start().await;
    mount_pga(&pga, "deposit", 200, 1).await;
    let h = harness(&pga, &pgb, BreakerSettings::default());
    let token = CancellationToken::new();
    let (addr, server) = start(h.orchestrator.clone(), token.clone()).await;

    let reply = exchange(addr, b"u1|2500").await;
    assert_eq!(reply, REPLY_SUCCESS);

    let received = pga.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(sent["userId"], "u1");
    assert_eq!(sent["amount"], 2500);
    assert_eq!(sent["currency"], "USD");
    assert_eq!(sent["type"], "deposit");

    token.cancel();
    server.await.unwrap();
}

#[tokio::test]
async fn test_bad_frame_gets_failure_reply() {
    let pga = MockServer::start().await;
    let pgb = MockServer::start().await;
    mount_pga(&pga, "deposit", 200, 0).await;
    let h = harness(&pga, &pgb, BreakerSettings::default());
    let token = CancellationToken::new();
    let (addr, server) = start(h.orchestrator.clone(), token.clone()).await;

    assert_eq!(exchange(addr, b"no delimiter").await, REPLY_FAILURE);
    assert_eq!(exchange(addr, b"u1|0").await, REPLY_FAILURE);

    token.cancel();
    server.await.unwrap();
}
