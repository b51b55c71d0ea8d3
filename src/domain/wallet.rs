use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};

/// Represents the funds a user holds, in minor currency units.
///
/// Balances are only ever changed through [`Wallet::credit`] and
/// [`Wallet::debit`], which keep the value non-negative and free of overflow.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct Wallet {
    /// The owner of the wallet.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Settled funds.
    pub balance: i64,
}

impl Wallet {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            balance: 0,
        }
    }

    pub fn with_balance(user_id: impl Into<String>, balance: i64) -> Self {
        Self {
            user_id: user_id.into(),
            balance,
        }
    }

    pub fn covers(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    /// Adds settled funds to the balance.
    pub fn credit(&mut self, amount: i64) -> Result<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| PaymentError::validation("balance overflow"))?;
        Ok(())
    }

    /// Removes settled funds if sufficient
    pub fn debit(&mut self, amount: i64) -> Result<()> {
        if self.covers(amount) {
            self.balance -= amount;
            Ok(())
        } else {
            Err(PaymentError::validation("insufficient funds"))
        }
    }
}
