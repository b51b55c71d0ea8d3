//! Domain model: wallets, transactions, payment messages, routing
//! configuration and the ports the application layer depends on.

pub mod payment;
pub mod ports;
pub mod routing;
pub mod transaction;
pub mod wallet;
