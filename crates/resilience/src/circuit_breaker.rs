// crates/resilience/src/circuit_breaker.rs
//! Circuit breaker pattern implementation
//!
//! ```text
//! Closed   --failures >= failure_threshold-->   Open
//! Open     --recovery_timeout elapsed, polled--> HalfOpen
//! HalfOpen --successes >= success_threshold-->  Closed
//! HalfOpen --any failure-->                     Open
//! ```
//!
//! In `Closed`, a success forgives one past failure instead of clearing
//! the count, so an isolated success cannot hide a degradation trend.

use crate::classify::Classify;
use crate::error::{ResilienceError, ResilienceResult};
use contentguard_telemetry::{event_types, Emitter, EventCategory};
use serde_json::json;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally
    Closed,
    /// Circuit is open, requests are rejected
    Open,
    /// Circuit is half-open, testing if service recovered
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit
    failure_threshold: usize,
    /// Duration to wait in `Open` before allowing a trial request
    recovery_timeout: Duration,
    /// Number of successful trial requests needed to close from half-open
    success_threshold: usize,
}

impl CircuitBreakerConfig {
    /// Creates a new configuration
    pub fn new(failure_threshold: usize, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            success_threshold: 2,
        }
    }

    /// Sets the success threshold
    pub fn with_success_threshold(mut self, threshold: usize) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn failure_threshold(&self) -> usize {
        self.failure_threshold
    }

    pub fn recovery_timeout(&self) -> Duration {
        self.recovery_timeout
    }

    pub fn success_threshold(&self) -> usize {
        self.success_threshold
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

/// A state change published to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// Name of the breaker, usually the endpoint it guards
    pub name: String,
    pub from: CircuitState,
    pub to: CircuitState,
}

/// Observer invoked on every state transition
pub type StateListener = Arc<dyn Fn(&StateTransition) + Send + Sync>;

/// Point-in-time view of a breaker
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitStats {
    pub state: CircuitState,
    pub failure_count: usize,
    pub success_count: usize,
    /// Time since the most recent failure
    pub last_failure_ago: Option<Duration>,
    /// Time left before an open circuit admits a trial request
    pub next_attempt_in: Option<Duration>,
}

/// Circuit breaker state
#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: usize,
    success_count: usize,
    last_failure_time: Option<Instant>,
    /// Only `Some` while `Open`
    next_attempt_time: Option<Instant>,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
            next_attempt_time: None,
        }
    }

    fn trip(&mut self, now: Instant, recovery_timeout: Duration) -> CircuitState {
        let from = self.state;
        self.state = CircuitState::Open;
        self.next_attempt_time = Some(now + recovery_timeout);
        from
    }
}

/// Circuit breaker implementation
///
/// Cloning yields another handle to the same breaker.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    state: Arc<Mutex<BreakerState>>,
    listeners: Arc<Mutex<Vec<StateListener>>>,
    emitter: Emitter,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker named `"global"`
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::named("global", config)
    }

    /// Creates a circuit breaker for a specific endpoint
    pub fn named(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            config,
            state: Arc::new(Mutex::new(BreakerState::closed())),
            listeners: Arc::new(Mutex::new(Vec::new())),
            emitter: Emitter::disabled(),
        }
    }

    /// Publishes failure, success and transition events through `emitter`
    pub fn with_telemetry(mut self, emitter: Emitter) -> Self {
        self.emitter = emitter;
        self
    }

    /// Registers a listener for state transitions
    pub fn on_state_change<F>(&self, listener: F)
    where
        F: Fn(&StateTransition) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(listener));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Gets the current state
    pub fn state(&self) -> CircuitState {
        lock(&self.state).state
    }

    /// Gets a snapshot of counters and timers
    pub fn stats(&self) -> CircuitStats {
        let state = lock(&self.state);
        let now = Instant::now();
        CircuitStats {
            state: state.state,
            failure_count: state.failure_count,
            success_count: state.success_count,
            last_failure_ago: state.last_failure_time.map(|t| now.duration_since(t)),
            next_attempt_in: state
                .next_attempt_time
                .map(|t| t.saturating_duration_since(now)),
        }
    }

    /// Records a successful operation
    pub fn record_success(&self) {
        let transition = {
            let mut state = lock(&self.state);
            match state.state {
                CircuitState::HalfOpen => {
                    state.success_count += 1;
                    if state.success_count >= self.config.success_threshold {
                        state.state = CircuitState::Closed;
                        state.failure_count = 0;
                        state.success_count = 0;
                        Some(CircuitState::HalfOpen)
                    } else {
                        None
                    }
                }
                CircuitState::Closed => {
                    state.failure_count = state.failure_count.saturating_sub(1);
                    None
                }
                CircuitState::Open => None,
            }
        };

        self.emitter.emit(
            event_types::CIRCUIT_SUCCESS,
            EventCategory::CircuitBreaker,
            json!({ "name": &*self.name }),
        );

        if let Some(from) = transition {
            self.notify(from, CircuitState::Closed);
        }
    }

    /// Records a failed operation
    pub fn record_failure(&self) {
        let now = Instant::now();
        let (transition, failures) = {
            let mut state = lock(&self.state);
            state.failure_count += 1;
            state.last_failure_time = Some(now);

            let transition = match state.state {
                CircuitState::Closed if state.failure_count >= self.config.failure_threshold => {
                    Some(state.trip(now, self.config.recovery_timeout))
                }
                CircuitState::HalfOpen => {
                    // A single failed trial cancels recovery.
                    state.success_count = 0;
                    Some(state.trip(now, self.config.recovery_timeout))
                }
                _ => None,
            };
            (transition, state.failure_count)
        };

        log::debug!("Circuit '{}' recorded failure #{}", self.name, failures);
        self.emitter.emit(
            event_types::CIRCUIT_FAILURE,
            EventCategory::CircuitBreaker,
            json!({ "name": &*self.name, "failure_count": failures }),
        );

        if let Some(from) = transition {
            self.notify(from, CircuitState::Open);
        }
    }

    /// Returns true if a request must not be issued
    ///
    /// This is the only place an open circuit advances: once the recovery
    /// timeout has elapsed the breaker moves to `HalfOpen` and this call
    /// returns false, letting the trial request through.
    pub fn is_open(&self) -> bool {
        self.poll().is_err()
    }

    /// Checks if a request can proceed
    pub fn check(&self) -> ResilienceResult<()> {
        self.poll()
            .map_err(|(failures, retry_after)| ResilienceError::CircuitOpen {
                endpoint: self.name.to_string(),
                failures,
                retry_after,
            })
    }

    /// Executes an operation through the circuit breaker
    ///
    /// Only failures whose kind trips the breaker are recorded; other
    /// failures pass through without touching the counters.
    pub fn call<F, T, E>(&self, operation: F) -> ResilienceResult<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        self.check()?;

        match operation() {
            Ok(result) => {
                self.record_success();
                Ok(result)
            }
            Err(e) => {
                let kind = e.kind();
                if kind.trips_breaker() {
                    self.record_failure();
                }
                Err(ResilienceError::Failed {
                    kind,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Resets the circuit breaker to closed state without notifying listeners
    pub fn reset(&self) {
        *lock(&self.state) = BreakerState::closed();
        log::debug!("Circuit '{}' reset", self.name);
    }

    /// Returns `Err((failures, retry_after))` while the circuit rejects calls
    fn poll(&self) -> Result<(), (usize, Duration)> {
        let now = Instant::now();
        {
            let mut state = lock(&self.state);
            if state.state != CircuitState::Open {
                return Ok(());
            }

            match state.next_attempt_time {
                Some(next) if now < next => {
                    return Err((state.failure_count, next.duration_since(now)));
                }
                _ => {
                    state.state = CircuitState::HalfOpen;
                    state.success_count = 0;
                    state.next_attempt_time = None;
                }
            }
        }

        self.notify(CircuitState::Open, CircuitState::HalfOpen);
        Ok(())
    }

    fn notify(&self, from: CircuitState, to: CircuitState) {
        log::info!("Circuit '{}' transitioned {} -> {}", self.name, from, to);

        let transition = StateTransition {
            name: self.name.to_string(),
            from,
            to,
        };

        self.emitter.emit(
            event_types::CIRCUIT_STATE_CHANGE,
            EventCategory::CircuitBreaker,
            json!({ "name": &*self.name, "from": from.as_str(), "to": to.as_str() }),
        );

        // Listeners may call back into the breaker, so run them unlocked.
        let listeners = lock(&self.listeners).clone();
        for listener in listeners {
            listener(&transition);
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
