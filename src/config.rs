//! Runtime configuration.
//!
//! Every option comes from a command line flag with an environment variable
//! fallback; `.env` files are loaded by the binary before parsing.

use crate::application::BreakerSettings;
use crate::domain::routing::{RoutingEntry, RoutingPolicy, RoutingTable};
use crate::error::{PaymentError, Result};
use crate::infrastructure::gateway::GatewayEndpoints;
use clap::{Parser, ValueEnum};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Payment gateway routing deposits and withdrawals across PSPs", long_about = None)]
pub struct Config {
    /// Address of the JSON HTTP API
    #[arg(long, env = "HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: SocketAddr,

    /// Address of the raw socket ingress
    #[arg(long, env = "TCP_ADDR", default_value = "0.0.0.0:9090")]
    pub tcp_addr: SocketAddr,

    /// Base URL of the PGA provider (JSON)
    #[arg(long, env = "PGA_URL", default_value = "http://pgsa.com")]
    pub pga_url: Url,

    /// Base URL of the PGB provider (SOAP)
    #[arg(long, env = "PGB_URL", default_value = "http://pgsb.com/soap")]
    pub pgb_url: Url,

    /// JSON file holding the ordered routing entries. Built-in PGA, PGB when absent.
    #[arg(long = "routing", env = "ROUTING_FILE")]
    pub routing_file: Option<PathBuf>,

    /// How candidates are drawn from the routing table
    #[arg(long, env = "ROUTING_POLICY", value_enum, default_value_t = RoutingPolicy::Declared)]
    pub routing_policy: RoutingPolicy,

    /// Currencies accepted by validation
    #[arg(
        long,
        env = "SUPPORTED_CURRENCIES",
        value_delimiter = ',',
        default_value = "USD,EUR,GBP,INR"
    )]
    pub currencies: Vec<String>,

    /// Currency applied to socket ingress deposits
    #[arg(long, env = "TCP_CURRENCY", default_value = "USD")]
    pub tcp_currency: String,

    /// Breaker counting window in milliseconds
    #[arg(long, env = "BREAKER_INTERVAL_MS", default_value_t = 500)]
    pub breaker_interval_ms: u64,

    /// Time an open breaker rejects calls, in milliseconds
    #[arg(long, env = "BREAKER_COOLDOWN_MS", default_value_t = 2000)]
    pub breaker_cooldown_ms: u64,

    /// Timeout for a single provider call in milliseconds. Unbounded when absent.
    #[arg(long, env = "PROVIDER_TIMEOUT_MS")]
    pub provider_timeout_ms: Option<u64>,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Print the resolved routing table as JSON and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Config {
    pub fn endpoints(&self) -> GatewayEndpoints {
        GatewayEndpoints {
            pga: self.pga_url.clone(),
            pgb: self.pgb_url.clone(),
        }
    }

    pub fn breaker_settings(&self) -> BreakerSettings {
        BreakerSettings {
            interval: Duration::from_millis(self.breaker_interval_ms),
            cooldown: Duration::from_millis(self.breaker_cooldown_ms),
            ..BreakerSettings::default()
        }
    }

    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }

    /// Loads the routing table from the configured file, or the built-in one.
    pub fn routing_table(&self) -> Result<RoutingTable> {
        let entries = match &self.routing_file {
            Some(path) => load_routing_entries(path)?,
            None => RoutingTable::default().entries().to_vec(),
        };
        Ok(RoutingTable::new(entries, self.routing_policy))
    }
}

/// Reads an ordered JSON list of routing entries.
pub fn load_routing_entries(path: &Path) -> Result<Vec<RoutingEntry>> {
    let raw = fs::read_to_string(path)?;
    let entries: Vec<RoutingEntry> = serde_json::from_str(&raw).map_err(|e| {
        PaymentError::Configuration(format!("routing file {}: {e}", path.display()))
    })?;
    if entries.is_empty() {
        return Err(PaymentError::Configuration(format!(
            "routing file {} lists no providers",
            path.display()
        )));
    }
    Ok(entries)
}
