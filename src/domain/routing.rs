use super::payment::PaymentRequest;
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of providers the gateway knows how to talk to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ProviderId {
    /// JSON over HTTP.
    #[serde(rename = "PGA")]
    Pga,
    /// SOAP/XML over HTTP.
    #[serde(rename = "PGB")]
    Pgb,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Pga, ProviderId::Pgb];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Pga => "PGA",
            ProviderId::Pgb => "PGB",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaymentError::NotImplemented(s.to_string()))
    }
}

/// One candidate provider in the static routing configuration.
///
/// The provider is kept as the configured string; it is resolved to a
/// [`ProviderId`] only when an attempt reaches this entry, so an unknown
/// provider is skipped rather than rejected at startup.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoutingEntry {
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(alias = "paymentGateway")]
    pub provider_name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub max_retry_count: u32,
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

impl RoutingEntry {
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            currency: String::new(),
            country_code: String::new(),
            provider_name: provider_name.into(),
            active: true,
            max_retry_count: 0,
            priority: 0,
        }
    }

    pub fn for_market(mut self, currency: &str, country_code: &str) -> Self {
        self.currency = currency.to_string();
        self.country_code = country_code.to_string();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    fn matches(&self, request: &PaymentRequest) -> bool {
        field_matches(&self.currency, &request.currency)
            && field_matches(&self.country_code, &request.country_code)
    }
}

fn field_matches(configured: &str, requested: &str) -> bool {
    configured.is_empty() || requested.is_empty() || configured.eq_ignore_ascii_case(requested)
}

/// How the orchestrator derives the candidate list from the routing table.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RoutingPolicy {
    /// Every entry, in declaration order, regardless of its fields.
    #[default]
    Declared,
    /// Active entries matching the request's market, by ascending priority.
    Matched,
}

/// The ordered routing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
    policy: RoutingPolicy,
}

impl RoutingTable {
    pub fn new(entries: Vec<RoutingEntry>, policy: RoutingPolicy) -> Self {
        Self { entries, policy }
    }

    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    /// Returns the entries to try for `request`, in attempt order.
    pub fn candidates(&self, request: &PaymentRequest) -> Vec<&RoutingEntry> {
        match self.policy {
            RoutingPolicy::Declared => self.entries.iter().collect(),
            RoutingPolicy::Matched => {
                let mut selected: Vec<&RoutingEntry> = self
                    .entries
                    .iter()
                    .filter(|entry| entry.active && entry.matches(request))
                    .collect();
                // stable: equal priorities keep declaration order
                selected.sort_by_key(|entry| entry.priority);
                selected
            }
        }
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new(
            vec![
                RoutingEntry {
                    max_retry_count: 3,
                    ..RoutingEntry::new("PGA").for_market("USD", "US")
                },
                RoutingEntry {
                    max_retry_count: 3,
                    ..RoutingEntry::new("PGB").for_market("USD", "US").with_priority(1)
                },
            ],
            RoutingPolicy::default(),
        )
    }
}
