//! Resilient HTTP access to the Hacker News API.

use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::policy::{retry_delay, CircuitBreaker, MAX_RETRIES};

/// Failure modes of an upstream call.
#[derive(Debug, Clone)]
pub enum UpstreamError {
  /// Connection-level failure: connect, timeout, body read
  Network(String),
  /// Upstream rejected the call with 429
  RateLimited,
  /// Any other non-success HTTP status
  Status(u16),
  /// The circuit breaker is open; the call was not attempted
  CircuitOpen,
}

impl UpstreamError {
  /// Transient failures are worth retrying; everything else surfaces
  /// immediately.
  pub fn is_transient(&self) -> bool {
    matches!(self, UpstreamError::Network(_) | UpstreamError::RateLimited)
  }
}

impl Display for UpstreamError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      UpstreamError::Network(e) => write!(f, "network error: {}", e),
      UpstreamError::RateLimited => f.write_str("upstream rate limited the request"),
      UpstreamError::Status(code) => write!(f, "upstream returned status {}", code),
      UpstreamError::CircuitOpen => f.write_str("circuit breaker is open"),
    }
  }
}

impl std::error::Error for UpstreamError {}

/// A single GET against the upstream, body returned as text.
///
/// This is the seam between the aggregation core and the network: the real
/// implementation is [`ResilientClient`]; tests substitute scripted fakes.
pub trait Upstream {
  async fn fetch(&self, url: &str) -> Result<String, UpstreamError>;
}

/// HTTP client that wraps every GET in the resilience stack: a per-attempt
/// timeout, a circuit breaker consulted before each attempt (a fast-fail
/// consumes no retry), and retry with exponential backoff on transient
/// failures.
pub struct ResilientClient {
  client: reqwest::Client,
  breaker: CircuitBreaker,
}

impl ResilientClient {
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("hnbest/", env!("CARGO_PKG_VERSION")))
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      breaker: CircuitBreaker::new(5, Duration::from_secs(30), Duration::from_secs(30)),
    })
  }

  async fn attempt(&self, url: &str) -> Result<String, UpstreamError> {
    if !self.breaker.allow_call() {
      return Err(UpstreamError::CircuitOpen);
    }

    let result = self.get_once(url).await;
    match &result {
      // Only connection-level failures count toward opening the circuit;
      // any HTTP response, error status included, means the upstream is
      // reachable.
      Err(UpstreamError::Network(_)) => self.breaker.record_failure(),
      _ => self.breaker.record_success(),
    }
    result
  }

  async fn get_once(&self, url: &str) -> Result<String, UpstreamError> {
    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| UpstreamError::Network(e.to_string()))?;

    match response.status() {
      StatusCode::TOO_MANY_REQUESTS => Err(UpstreamError::RateLimited),
      status if !status.is_success() => Err(UpstreamError::Status(status.as_u16())),
      _ => response
        .text()
        .await
        .map_err(|e| UpstreamError::Network(e.to_string())),
    }
  }
}

impl Upstream for ResilientClient {
  async fn fetch(&self, url: &str) -> Result<String, UpstreamError> {
    let mut attempt = 0;
    loop {
      match self.attempt(url).await {
        Ok(body) => return Ok(body),
        Err(err) if err.is_transient() && attempt < MAX_RETRIES => {
          attempt += 1;
          let delay = retry_delay(attempt);
          warn!(
            "transient failure fetching {} (attempt {}): {}; retrying in {:?}",
            url, attempt, err, delay
          );
          sleep(delay).await;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transient_classification() {
    assert!(UpstreamError::Network("connection reset".to_string()).is_transient());
    assert!(UpstreamError::RateLimited.is_transient());

    // Non-transient statuses surface immediately, without retry
    assert!(!UpstreamError::Status(404).is_transient());
    assert!(!UpstreamError::Status(500).is_transient());
    assert!(!UpstreamError::CircuitOpen.is_transient());
  }

  #[test]
  fn test_error_display() {
    assert_eq!(
      UpstreamError::Status(503).to_string(),
      "upstream returned status 503"
    );
    assert_eq!(
      UpstreamError::CircuitOpen.to_string(),
      "circuit breaker is open"
    );
  }
}
