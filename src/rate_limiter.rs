use crate::clock::{Clock, TokioClock};
use crate::config::RateLimits;
use crate::error::Result;
use crate::telemetry::{Event, EventLevel, EventSink, TracingSink};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Spacing and throttle-retry settings for a [`RateGate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Minimum gap between two granted requests
    pub delay_between_requests: Duration,
    /// Throttle backoff is `delay_between_requests * backoff_multiplier`
    pub backoff_multiplier: u32,
    /// Total attempts for one request, the first included
    pub max_attempts: u32,
    /// Upper bound of the uniform jitter added to each backoff
    pub jitter: Duration,
    /// Advisory daily budget; exceeding it is reported, never enforced
    pub requests_per_day: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RateLimits::default())
    }
}

impl From<&RateLimits> for RetryPolicy {
    fn from(limits: &RateLimits) -> Self {
        Self {
            delay_between_requests: limits.delay_between_requests(),
            backoff_multiplier: limits.backoff_multiplier,
            max_attempts: limits.max_attempts,
            jitter: Duration::from_millis(limits.jitter_ms),
            requests_per_day: u64::from(limits.requests_per_day),
        }
    }
}

struct GateState {
    last_request: Option<Instant>,
    request_count: u64,
}

/// Serializes outbound model requests
///
/// Every request waits until `delay_between_requests` has passed since the
/// previous one. Requests rejected with a throttle error are retried after a
/// longer backoff, up to `max_attempts` in total.
pub struct RateGate {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    state: Mutex<GateState>,
}

impl RateGate {
    /// Creates a gate on the wall clock that logs through `tracing`
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_clock(policy, Arc::new(TokioClock))
    }

    /// Creates a gate on the given clock
    pub fn with_clock(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            sink: Arc::new(TracingSink),
            state: Mutex::new(GateState {
                last_request: None,
                request_count: 0,
            }),
        }
    }

    /// Replaces the diagnostics sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The gate's policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The sink diagnostics go to; shared with the components using this gate
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Emits an event through the gate's sink
    pub fn emit(&self, event: Event) {
        self.sink.emit(event);
    }

    /// Number of requests granted so far
    pub async fn request_count(&self) -> u64 {
        self.state.lock().await.request_count
    }

    /// Instant of the most recently granted request
    pub async fn last_request(&self) -> Option<Instant> {
        self.state.lock().await.last_request
    }

    /// Waits until a request may be issued, then records it
    ///
    /// The state lock is held across the wait so that concurrent callers
    /// queue up behind each other instead of all waking at once.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;
        let delay = self.policy.delay_between_requests;

        let mut waited = Duration::ZERO;
        if let Some(last) = state.last_request {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < delay {
                waited = delay - elapsed;
                debug!("Waiting {:?} before next request...", waited);
                self.clock.sleep(waited).await;
            }
        }

        state.last_request = Some(self.clock.now());
        state.request_count += 1;
        let count = state.request_count;
        drop(state);

        self.sink.emit(
            Event::new("rate_gate.acquired")
                .with("request", count)
                .with("daily_budget", self.policy.requests_per_day)
                .with("waited_ms", waited.as_millis()),
        );

        if count > self.policy.requests_per_day {
            self.sink.emit(
                Event::new("rate_gate.daily_budget_exceeded")
                    .level(EventLevel::Warn)
                    .with("request", count)
                    .with("daily_budget", self.policy.requests_per_day),
            );
        }
    }

    /// Runs `op` behind the gate, retrying throttled attempts
    ///
    /// Non-throttle errors are returned immediately. A throttle error on the
    /// final attempt is returned as is.
    pub async fn run<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.acquire().await;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_throttle() && attempt < max_attempts => {
                    let backoff = self.backoff();
                    warn!("Rate limit hit, waiting {:?} before retrying...", backoff);
                    self.sink.emit(
                        Event::new("rate_gate.throttled")
                            .level(EventLevel::Warn)
                            .with("attempt", attempt)
                            .with("max_attempts", max_attempts)
                            .with("backoff_ms", backoff.as_millis()),
                    );
                    self.clock.sleep(backoff).await;
                }
                Err(e) => {
                    if e.is_throttle() {
                        self.sink.emit(
                            Event::new("rate_gate.retries_exhausted")
                                .level(EventLevel::Warn)
                                .with("attempts", attempt),
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    fn backoff(&self) -> Duration {
        let base = self
            .policy
            .delay_between_requests
            .saturating_mul(self.policy.backoff_multiplier);
        let jitter_ms = u64::try_from(self.policy.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        base.saturating_add(Duration::from_millis(extra))
    }
}
