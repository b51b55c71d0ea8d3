//! Per-provider circuit breakers.
//!
//! A breaker counts requests and failures while `Closed`, clearing the counts
//! every `interval`. It trips to `Open` once at least `min_requests` were seen
//! and the failure ratio reaches `failure_ratio`. After `cooldown` it lets a
//! single trial call through (`HalfOpen`); the trial's result decides between
//! `Closed` and another cooldown.
//!
//! Results are attributed to the generation they started in, so a call that
//! straddles a state change cannot corrupt the counts of the next window.

use crate::error::{PaymentError, Result};
use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerSettings {
    /// Length of the counting window while closed.
    pub interval: Duration,
    /// How long an open breaker rejects calls.
    pub cooldown: Duration,
    /// Requests required in a window before the ratio is considered.
    pub min_requests: u32,
    /// Failure ratio that trips the breaker.
    pub failure_ratio: f64,
    /// Trial calls admitted while half-open.
    pub half_open_max_requests: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            cooldown: Duration::from_secs(2),
            min_requests: 3,
            failure_ratio: 0.6,
            half_open_max_requests: 1,
        }
    }
}

/// Request counters for the current generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
    }

    fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    generation: u64,
    counts: Counts,
    /// End of the counting window (closed) or of the cooldown (open).
    expiry: Option<Instant>,
}

pub struct CircuitBreaker {
    name: String,
    settings: BreakerSettings,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, settings: BreakerSettings) -> Self {
        Self::new_at(name, settings, Instant::now())
    }

    fn new_at(name: impl Into<String>, settings: BreakerSettings, now: Instant) -> Self {
        let breaker = Self {
            name: name.into(),
            settings,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry: None,
            }),
        };
        {
            let mut inner = breaker.lock();
            breaker.new_generation(&mut inner, now);
        }
        breaker
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BreakerState {
        self.state_at(Instant::now())
    }

    pub fn counts(&self) -> Counts {
        self.lock().counts
    }

    pub fn state_at(&self, now: Instant) -> BreakerState {
        let mut inner = self.lock();
        self.current_state(&mut inner, now)
    }

    /// Runs `call` if the breaker admits it and records the outcome.
    ///
    /// A rejected call is never polled and returns
    /// [`PaymentError::CircuitOpen`] without touching the counters. A call
    /// dropped before it completes is recorded as a failure, so a cancelled
    /// half-open trial reopens the breaker instead of holding the trial slot.
    pub async fn call<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let pending = PendingCall {
            breaker: self,
            generation: self.before_request(Instant::now())?,
        };
        let result = call.await;
        pending.finish(result.is_ok());
        result
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // counters stay consistent across a panic, so recover the guard
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn before_request(&self, now: Instant) -> Result<u64> {
        let mut inner = self.lock();
        let state = self.current_state(&mut inner, now);
        match state {
            BreakerState::Open => return Err(PaymentError::CircuitOpen(self.name.clone())),
            BreakerState::HalfOpen
                if inner.counts.requests >= self.settings.half_open_max_requests =>
            {
                return Err(PaymentError::CircuitOpen(self.name.clone()));
            }
            _ => {}
        }
        inner.counts.on_request();
        Ok(inner.generation)
    }

    fn after_request(&self, generation: u64, success: bool, now: Instant) {
        let mut inner = self.lock();
        let state = self.current_state(&mut inner, now);
        if generation != inner.generation {
            return;
        }
        if success {
            self.on_success(&mut inner, state, now);
        } else {
            self.on_failure(&mut inner, state, now);
        }
    }

    fn on_success(&self, inner: &mut Inner, state: BreakerState, now: Instant) {
        match state {
            BreakerState::Closed => inner.counts.on_success(),
            BreakerState::HalfOpen => {
                inner.counts.on_success();
                if inner.counts.consecutive_successes >= self.settings.half_open_max_requests {
                    self.set_state(inner, BreakerState::Closed, now);
                }
            }
            BreakerState::Open => {}
        }
    }

    fn on_failure(&self, inner: &mut Inner, state: BreakerState, now: Instant) {
        match state {
            BreakerState::Closed => {
                inner.counts.on_failure();
                if self.ready_to_trip(&inner.counts) {
                    self.set_state(inner, BreakerState::Open, now);
                }
            }
            BreakerState::HalfOpen => self.set_state(inner, BreakerState::Open, now),
            BreakerState::Open => {}
        }
    }

    fn ready_to_trip(&self, counts: &Counts) -> bool {
        if counts.requests < self.settings.min_requests || counts.requests == 0 {
            return false;
        }
        let ratio = f64::from(counts.total_failures) / f64::from(counts.requests);
        tracing::debug!(
            provider = %self.name,
            requests = counts.requests,
            failures = counts.total_failures,
            ratio,
            "breaker trip check"
        );
        ratio >= self.settings.failure_ratio
    }

    fn current_state(&self, inner: &mut Inner, now: Instant) -> BreakerState {
        match inner.state {
            BreakerState::Closed => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.new_generation(inner, now);
                }
            }
            BreakerState::Open => {
                if inner.expiry.is_some_and(|expiry| expiry <= now) {
                    self.set_state(inner, BreakerState::HalfOpen, now);
                }
            }
            BreakerState::HalfOpen => {}
        }
        inner.state
    }

    fn set_state(&self, inner: &mut Inner, state: BreakerState, now: Instant) {
        if inner.state == state {
            return;
        }
        let previous = inner.state;
        inner.state = state;
        self.new_generation(inner, now);
        tracing::info!(
            provider = %self.name,
            from = %previous,
            to = %state,
            "circuit breaker state changed"
        );
    }

    fn new_generation(&self, inner: &mut Inner, now: Instant) {
        inner.generation = inner.generation.wrapping_add(1);
        inner.counts = Counts::default();
        inner.expiry = match inner.state {
            BreakerState::Closed if !self.settings.interval.is_zero() => {
                Some(now + self.settings.interval)
            }
            BreakerState::Closed | BreakerState::HalfOpen => None,
            BreakerState::Open => Some(now + self.settings.cooldown),
        };
    }
}

/// An admitted call whose outcome is not recorded yet.
struct PendingCall<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
}

impl PendingCall<'_> {
    fn finish(self, success: bool) {
        let this = std::mem::ManuallyDrop::new(self);
        this.breaker
            .after_request(this.generation, success, Instant::now());
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.breaker
            .after_request(self.generation, false, Instant::now());
    }
}

/// Lazily created breakers, one per provider identifier.
#[derive(Default)]
pub struct BreakerRegistry {
    settings: BreakerSettings,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            breakers: DashMap::new(),
        }
    }

    /// Returns the provider's breaker, creating it on first use.
    ///
    /// Creation goes through the map's entry lock, so concurrent first calls
    /// for one provider share a single breaker.
    pub fn get_or_create(&self, provider: &str) -> Arc<CircuitBreaker> {
        let breaker = self
            .breakers
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(provider, self.settings)));
        Arc::clone(breaker.value())
    }

    pub fn get(&self, provider: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers
            .get(provider)
            .map(|breaker| Arc::clone(breaker.value()))
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
