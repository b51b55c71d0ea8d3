//! Ingress edges translating external requests into orchestrator calls.

pub mod http;
pub mod tcp;
