use crate::domain::payment::Action;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("gateway transport error: {0}")]
    GatewayTransport(String),
    #[error("gateway response error: {0}")]
    GatewayResponse(String),
    #[error("request encoding error: {0}")]
    Encoding(String),
    #[error("payment gateway not implemented: {0}")]
    NotImplemented(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("circuit breaker for {0} rejected the call")]
    CircuitOpen(String),
    #[error("transaction {id} is already {current}, cannot move to {requested}")]
    InvalidTransition {
        id: String,
        current: String,
        requested: String,
    },
    #[error("{action} operation failed{}", .source.as_ref().map(|e| format!(": {e}")).unwrap_or_default())]
    Exhausted {
        action: Action,
        #[source]
        source: Option<Box<PaymentError>>,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PaymentError {
    pub fn validation(cause: impl Into<String>) -> Self {
        Self::Validation(cause.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
