//! Application layer: the payment orchestration and the breakers guarding
//! each provider.

pub mod breaker;
pub mod orchestrator;

pub use breaker::{BreakerRegistry, BreakerSettings, BreakerState, CircuitBreaker};
pub use orchestrator::PaymentOrchestrator;
