// crates/resilience/src/classify.rs
//! Error taxonomy shared by the retry strategy and the circuit breaker

use std::fmt;

/// Category of a failed upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection refused/reset, DNS failure
    Network,
    /// Request did not complete in time
    Timeout,
    /// HTTP 5xx
    Server,
    /// HTTP 4xx other than 429
    Client,
    /// HTTP 429 from the upstream, or a local rate-limiter rejection
    RateLimit,
    /// Raised locally while the breaker is open; no request was made
    CircuitOpen,
    /// Anything that could not be classified
    Unknown,
}

impl ErrorKind {
    /// Classifies an HTTP status code
    ///
    /// Success and redirect codes are not failures and map to `Unknown`
    /// if a caller asks anyway.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => ErrorKind::RateLimit,
            500..=599 => ErrorKind::Server,
            400..=499 => ErrorKind::Client,
            _ => ErrorKind::Unknown,
        }
    }

    /// Whether a retry may succeed where this attempt failed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server | ErrorKind::RateLimit
        )
    }

    /// Whether this failure counts against the upstream's health
    ///
    /// A busy upstream (429) is alive, so it does not trip the breaker.
    pub fn trips_breaker(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Server => "server",
            ErrorKind::Client => "client",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that know which [`ErrorKind`] they belong to
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}
