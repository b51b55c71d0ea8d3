use crate::domain::payment::{Action, SettlementState};
use crate::domain::ports::Ledger;
use crate::domain::transaction::{SettlementOutcome, Transaction, TransactionState};
use crate::domain::wallet::Wallet;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    wallets: HashMap<String, Wallet>,
    transactions: HashMap<String, Transaction>,
}

/// A thread-safe in-memory ledger of wallets and transactions.
///
/// Both maps sit behind a single `Arc<RwLock<..>>`: reads run concurrently,
/// every write (including lazy wallet creation and settlement) is exclusive.
/// Nothing survives a restart.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

fn audit_wallet(wallet: &Wallet) {
    tracing::info!(
        target: "ledger",
        user_id = %wallet.user_id,
        wallet = %serde_json::to_string(wallet).unwrap_or_default(),
        "wallet updated"
    );
}

fn audit_transaction(txn: &Transaction) {
    tracing::info!(
        target: "ledger",
        user_id = %txn.user_id,
        transaction = %serde_json::to_string(txn).unwrap_or_default(),
        "transaction updated"
    );
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get_wallet(&self, user_id: &str) -> Result<Wallet> {
        if let Some(wallet) = self.state.read().await.wallets.get(user_id) {
            return Ok(wallet.clone());
        }
        // insert-if-absent under the write lock: a concurrent first access
        // observes the wallet created here instead of fabricating its own
        let mut state = self.state.write().await;
        let wallet = state
            .wallets
            .entry(user_id.to_string())
            .or_insert_with(|| Wallet::new(user_id));
        Ok(wallet.clone())
    }

    async fn update_wallet(&self, wallet: Wallet) -> Result<()> {
        let mut state = self.state.write().await;
        audit_wallet(&wallet);
        state.wallets.insert(wallet.user_id.clone(), wallet);
        Ok(())
    }

    async fn get_transaction(&self, txn_id: &str) -> Result<Transaction> {
        let state = self.state.read().await;
        state
            .transactions
            .get(txn_id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("transaction {txn_id}")))
    }

    async fn update_transaction(&self, txn: Transaction) -> Result<()> {
        let mut state = self.state.write().await;
        audit_transaction(&txn);
        state.transactions.insert(txn.id.clone(), txn);
        Ok(())
    }

    async fn settle(&self, txn_id: &str, settlement: SettlementState) -> Result<SettlementOutcome> {
        let mut state = self.state.write().await;
        let mut txn = state
            .transactions
            .get(txn_id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("transaction {txn_id}")))?;

        let outcome = txn.settle(settlement)?;
        if outcome == SettlementOutcome::Applied(TransactionState::Approved) {
            let mut wallet = state
                .wallets
                .get(&txn.user_id)
                .cloned()
                .unwrap_or_else(|| Wallet::new(txn.user_id.clone()));
            match txn.r#type {
                Action::Deposit => wallet.credit(txn.amount)?,
                Action::Withdraw => wallet.debit(txn.amount)?,
            }
            audit_wallet(&wallet);
            state.wallets.insert(wallet.user_id.clone(), wallet);
        }

        if !matches!(outcome, SettlementOutcome::Replayed(_)) {
            audit_transaction(&txn);
            state.transactions.insert(txn.id.clone(), txn);
        }
        Ok(outcome)
    }
}
