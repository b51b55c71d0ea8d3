use super::payment::{CallbackRequest, PaymentRequest, PaymentResponse, SettlementState};
use super::routing::ProviderId;
use super::transaction::{SettlementOutcome, Transaction};
use super::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Authoritative store of wallets and transactions.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Returns the user's wallet, creating an empty one on first access.
    async fn get_wallet(&self, user_id: &str) -> Result<Wallet>;
    async fn update_wallet(&self, wallet: Wallet) -> Result<()>;
    async fn get_transaction(&self, txn_id: &str) -> Result<Transaction>;
    async fn update_transaction(&self, txn: Transaction) -> Result<()>;
    /// Applies a settlement callback to a transaction and its wallet as one
    /// atomic step.
    async fn settle(&self, txn_id: &str, state: SettlementState) -> Result<SettlementOutcome>;
}

/// A payment service provider behind the uniform deposit/withdraw contract.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> ProviderId;
    async fn deposit(&self, request: &PaymentRequest) -> Result<PaymentResponse>;
    async fn withdraw(&self, request: &PaymentRequest) -> Result<PaymentResponse>;
}

/// Resolves a configured provider identifier to a gateway.
pub trait GatewayFactory: Send + Sync {
    fn resolve(&self, provider: &str) -> Result<GatewayRef>;
}

/// The operations exposed to the ingress edges.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn deposit(&self, request: PaymentRequest) -> Result<PaymentResponse>;
    async fn withdraw(&self, request: PaymentRequest) -> Result<PaymentResponse>;
    async fn handle_callback(&self, callback: CallbackRequest) -> Result<SettlementOutcome>;
}

pub type LedgerRef = Arc<dyn Ledger>;
pub type GatewayRef = Arc<dyn PaymentGateway>;
pub type GatewayFactoryRef = Arc<dyn GatewayFactory>;
pub type PaymentServiceRef = Arc<dyn PaymentService>;
