use super::breaker::{BreakerRegistry, BreakerState};
use crate::domain::payment::{Action, CallbackRequest, PaymentRequest, PaymentResponse};
use crate::domain::ports::{GatewayFactoryRef, LedgerRef, PaymentService};
use crate::domain::routing::RoutingTable;
use crate::domain::transaction::{SettlementOutcome, Transaction};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

/// Routes payment requests to the configured providers.
///
/// Each request walks the routing candidates strictly in order. A provider
/// whose breaker is open is skipped without a network call; the first
/// successful provider call persists the transaction and ends the walk.
pub struct PaymentOrchestrator {
    ledger: LedgerRef,
    factory: GatewayFactoryRef,
    breakers: BreakerRegistry,
    routing: RoutingTable,
    currencies: HashSet<String>,
}

impl PaymentOrchestrator {
    /// Creates an orchestrator.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The wallet and transaction store.
    /// * `factory` - Resolves routing entries to provider adapters.
    /// * `breakers` - The per-provider breaker registry.
    /// * `routing` - The routing table consulted for every attempt.
    /// * `currencies` - ISO codes accepted by validation.
    pub fn new(
        ledger: LedgerRef,
        factory: GatewayFactoryRef,
        breakers: BreakerRegistry,
        routing: RoutingTable,
        currencies: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            ledger,
            factory,
            breakers,
            routing,
            currencies: currencies
                .into_iter()
                .map(|c| c.trim().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    fn validate(&self, request: &PaymentRequest) -> Result<()> {
        if request.user_id.trim().is_empty() {
            return Err(PaymentError::validation("invalid account id"));
        }
        if !self.currencies.contains(&request.currency) {
            return Err(PaymentError::validation("invalid currency"));
        }
        if request.amount <= 0 {
            return Err(PaymentError::validation("invalid amount"));
        }
        Ok(())
    }

    async fn process(&self, mut request: PaymentRequest, action: Action) -> Result<PaymentResponse> {
        request.action = action;
        request.currency = request.currency.trim().to_ascii_uppercase();
        self.validate(&request)?;

        if action == Action::Withdraw {
            let wallet = self.ledger.get_wallet(&request.user_id).await?;
            if !wallet.covers(request.amount) {
                return Err(PaymentError::validation("insufficient funds"));
            }
        }

        let txn_id = Uuid::new_v4().to_string();
        let txn = Transaction::authorized(txn_id.clone(), &request);
        request.transaction_id = Some(txn_id.clone());

        let mut last_error: Option<PaymentError> = None;
        for entry in self.routing.candidates(&request) {
            let provider = entry.provider_name.as_str();
            let breaker = self.breakers.get_or_create(provider);
            if breaker.state() == BreakerState::Open {
                tracing::warn!(provider, transaction_id = %txn_id, "circuit open, skipping provider");
                continue;
            }

            let gateway = match self.factory.resolve(provider) {
                Ok(gateway) => gateway,
                Err(e) => {
                    tracing::error!(provider, error = %e, "failed to resolve payment gateway");
                    last_error = Some(e);
                    continue;
                }
            };

            let call = async {
                match action {
                    Action::Deposit => gateway.deposit(&request).await,
                    Action::Withdraw => gateway.withdraw(&request).await,
                }
            };
            match breaker.call(call).await {
                Ok(response) => {
                    tracing::info!(
                        provider,
                        transaction_id = %txn_id,
                        user_id = %request.user_id,
                        %action,
                        amount = %request.major_amount().unwrap_or_default(),
                        currency = %request.currency,
                        "provider accepted payment"
                    );
                    self.ledger.update_transaction(txn).await?;
                    return Ok(response);
                }
                Err(e) => {
                    tracing::warn!(
                        provider,
                        transaction_id = %txn_id,
                        %action,
                        error = %e,
                        "provider call failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        tracing::error!(
            target: "audit",
            transaction_id = %txn_id,
            user_id = %request.user_id,
            %action,
            amount = request.amount,
            currency = %request.currency,
            last_error = %last_error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            "all providers failed"
        );
        Err(PaymentError::Exhausted {
            action,
            source: last_error.map(Box::new),
        })
    }
}

#[async_trait]
impl PaymentService for PaymentOrchestrator {
    async fn deposit(&self, request: PaymentRequest) -> Result<PaymentResponse> {
        self.process(request, Action::Deposit).await
    }

    async fn withdraw(&self, request: PaymentRequest) -> Result<PaymentResponse> {
        self.process(request, Action::Withdraw).await
    }

    async fn handle_callback(&self, callback: CallbackRequest) -> Result<SettlementOutcome> {
        let outcome = self
            .ledger
            .settle(&callback.transaction_id, callback.state)
            .await?;
        tracing::info!(
            transaction_id = %callback.transaction_id,
            ?outcome,
            "settlement callback handled"
        );
        Ok(outcome)
    }
}
