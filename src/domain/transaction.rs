use super::payment::{Action, PaymentRequest, SettlementState};
use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionState {
    #[default]
    Authorized,
    Approved,
    Failed,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Authorized)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Authorized => "AUTHORIZED",
            TransactionState::Approved => "APPROVED",
            TransactionState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// What a settlement callback did to a transaction.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOutcome {
    /// The transaction left `Authorized` and reached the given state.
    Applied(TransactionState),
    /// The transaction was already in the requested terminal state.
    Replayed(TransactionState),
    /// The callback carried a state the ledger does not act upon.
    Ignored,
}

/// A payment attempt that some provider accepted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub amount: i64,
    pub currency: String,
    pub r#type: Action,
    pub state: TransactionState,
}

impl Transaction {
    /// Builds the in-memory record for a fresh attempt.
    pub fn authorized(id: impl Into<String>, request: &PaymentRequest) -> Self {
        Self {
            id: id.into(),
            user_id: request.user_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            r#type: request.action,
            state: TransactionState::Authorized,
        }
    }

    /// Applies a settlement state.
    ///
    /// Only `Authorized -> {Approved, Failed}` changes the record. Repeating the
    /// current terminal state is reported as a replay, any other move out of a
    /// terminal state is rejected.
    pub fn settle(&mut self, settlement: SettlementState) -> Result<SettlementOutcome> {
        let target = match settlement {
            SettlementState::Approved => TransactionState::Approved,
            SettlementState::Failed => TransactionState::Failed,
            SettlementState::Other => return Ok(SettlementOutcome::Ignored),
        };

        match self.state {
            TransactionState::Authorized => {
                self.state = target;
                Ok(SettlementOutcome::Applied(target))
            }
            current if current == target => Ok(SettlementOutcome::Replayed(current)),
            current => Err(PaymentError::InvalidTransition {
                id: self.id.clone(),
                current: current.to_string(),
                requested: target.to_string(),
            }),
        }
    }
}
