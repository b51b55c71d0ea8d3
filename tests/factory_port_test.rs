use payswitch::domain::ports::{GatewayFactory, GatewayFactoryRef};
use payswitch::domain::routing::ProviderId;
use payswitch::error::PaymentError;
use payswitch::infrastructure::gateway::{DefaultGatewayFactory, GatewayEndpoints};
use std::sync::Arc;

fn factory() -> GatewayFactoryRef {
    let endpoints = GatewayEndpoints {
        pga: "http://pgsa.com".parse().unwrap(),
        pgb: "http://pgsb.com/soap".parse().unwrap(),
    };
    Arc::new(DefaultGatewayFactory::new(&endpoints, None).unwrap())
}

#[test]
fn test_factory_resolves_configured_names() {
    let factory = factory();
    assert_eq!(factory.resolve("PGA").unwrap().provider(), ProviderId::Pga);
    assert_eq!(factory.resolve(" pgb ").unwrap().provider(), ProviderId::Pgb);
}

#[test]
fn test_factory_rejects_unknown_provider() {
    let err = factory().resolve("PGX").err().unwrap();
    assert!(matches!(err, PaymentError::NotImplemented(ref name) if name == "PGX"));
    assert_eq!(err.to_string(), "payment gateway not implemented: PGX");
}

#[tokio::test]
async fn test_factory_in_task() {
    let factory = factory();
    let handle = tokio::spawn(async move { factory.resolve("PGA").map(|g| g.provider()) });
    assert_eq!(handle.await.unwrap().unwrap(), ProviderId::Pga);
}

#[test]
fn test_factory_shares_adapters() {
    let factory = factory();
    let first = factory.resolve("PGA").unwrap();
    let second = factory.resolve("PGA").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
