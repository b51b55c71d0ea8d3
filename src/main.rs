use clap::Parser;
use dotenvy::dotenv;
use miette::{IntoDiagnostic, Result};
use payswitch::application::{BreakerRegistry, PaymentOrchestrator};
use payswitch::config::Config;
use payswitch::domain::ports::PaymentServiceRef;
use payswitch::infrastructure::gateway::DefaultGatewayFactory;
use payswitch::infrastructure::in_memory::InMemoryLedger;
use payswitch::interfaces::http::{self, AppState};
use payswitch::interfaces::tcp::{DelimitedFrameParser, TcpIngress};
use payswitch::shutdown::ShutdownSignal;
use payswitch::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::parse();

    let routing = config.routing_table().into_diagnostic()?;
    if config.check_config {
        let rendered = serde_json::to_string_pretty(routing.entries()).into_diagnostic()?;
        println!("{rendered}");
        return Ok(());
    }

    telemetry::init(config.log_format);

    let factory =
        DefaultGatewayFactory::new(&config.endpoints(), config.provider_timeout()).into_diagnostic()?;
    let orchestrator = PaymentOrchestrator::new(
        Arc::new(InMemoryLedger::new()),
        Arc::new(factory),
        BreakerRegistry::new(config.breaker_settings()),
        routing,
        config.currencies.clone(),
    );
    let payments: PaymentServiceRef = Arc::new(orchestrator);

    let shutdown = ShutdownSignal::try_new().into_diagnostic()?;

    let tcp_listener = TcpListener::bind(config.tcp_addr).await.into_diagnostic()?;
    tracing::info!(addr = %config.tcp_addr, "socket ingress listening");
    let ingress = Arc::new(TcpIngress::new(
        Arc::clone(&payments),
        Arc::new(DelimitedFrameParser),
        config.tcp_currency.clone(),
    ));
    let tcp_task = tokio::spawn(ingress.serve(tcp_listener, shutdown.token()));

    let http_listener = TcpListener::bind(config.http_addr).await.into_diagnostic()?;
    tracing::info!(addr = %config.http_addr, "HTTP API listening");
    let token = shutdown.token();
    axum::serve(http_listener, http::router(AppState::new(payments)))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .into_diagnostic()?;

    // stop the socket ingress as well
    shutdown.token().cancel();
    tcp_task.await.into_diagnostic()?;
    shutdown.wait().await;
    tracing::info!("shutdown complete");
    Ok(())
}
