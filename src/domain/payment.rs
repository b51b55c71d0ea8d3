use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two operations a provider can settle.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Deposit,
    Withdraw,
}

impl Action {
    /// Path segment used by every provider endpoint for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Deposit => "deposit",
            Action::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment request as consumed by the orchestrator.
///
/// `amount` is expressed in minor currency units; `exponent` tells how many of
/// those digits are decimals (2 for cents).
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRequest {
    pub user_id: String,
    pub currency: String,
    pub amount: i64,
    #[serde(default)]
    pub exponent: u32,
    #[serde(default)]
    pub country_code: String,
    pub action: Action,
    /// Stamped by the orchestrator once the attempt has an identity.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl PaymentRequest {
    pub fn new(
        action: Action,
        user_id: impl Into<String>,
        currency: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            currency: currency.into(),
            amount,
            exponent: 0,
            country_code: String::new(),
            action,
            transaction_id: None,
        }
    }

    pub fn with_exponent(mut self, exponent: u32) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    /// The amount in major units (e.g. `100.00` for 10000 cents), if the
    /// exponent is representable.
    pub fn major_amount(&self) -> Option<Decimal> {
        Decimal::try_new(self.amount, self.exponent).ok()
    }

    pub fn transaction_id(&self) -> &str {
        self.transaction_id.as_deref().unwrap_or_default()
    }
}

/// The provider's answer for an accepted request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentResponse {
    pub status: String,
    pub message: String,
    #[serde(
        rename = "transactionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_id: Option<String>,
}

/// Final state reported by a settlement callback.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementState {
    Approved,
    Failed,
    /// Any state value the gateway does not act upon.
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CallbackRequest {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub state: SettlementState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_amount_uses_exponent() {
        let request = PaymentRequest::new(Action::Deposit, "u1", "USD", 10050).with_exponent(2);
        assert_eq!(request.major_amount().unwrap().to_string(), "100.50");
    }

    #[test]
    fn test_major_amount_rejects_unrepresentable_exponent() {
        let request = PaymentRequest::new(Action::Deposit, "u1", "USD", 1).with_exponent(40);
        assert!(request.major_amount().is_none());
    }

    #[test]
    fn test_callback_state_deserialization() {
        let approved: CallbackRequest =
            serde_json::from_str(r#"{"transactionId":"t1","state":"APPROVED"}"#).unwrap();
        assert_eq!(approved.state, SettlementState::Approved);

        let failed: CallbackRequest =
            serde_json::from_str(r#"{"transactionId":"t1","state":"FAILED"}"#).unwrap();
        assert_eq!(failed.state, SettlementState::Failed);

        let pending: CallbackRequest =
            serde_json::from_str(r#"{"transactionId":"t1","state":"PENDING"}"#).unwrap();
        assert_eq!(pending.state, SettlementState::Other);
    }

    #[test]
    fn test_response_omits_missing_transaction_id() {
        let response = PaymentResponse {
            status: "success".to_string(),
            message: "ok".to_string(),
            transaction_id: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"success","message":"ok"}"#);
    }
}
