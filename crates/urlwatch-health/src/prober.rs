//! HTTP probe logic.
//!
//! Performs a single GET against a monitor's URL with a bounded timeout
//! and classifies the outcome into an unsaved health record.

use std::error::Error as _;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::debug;

use urlwatch_core::PROBE_TIMEOUT;
use urlwatch_state::{MonitorId, NewHealthRecord};

use crate::error::{SchedulerError, SchedulerResult};

/// Executes health probes. Cheap to share behind an `Arc`; the inner
/// client pools connections across probes.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    /// Create a prober with the fixed process-wide timeout.
    pub fn new(user_agent: &str) -> SchedulerResult<Self> {
        Self::with_timeout(user_agent, PROBE_TIMEOUT)
    }

    /// Create a prober with a custom timeout (for testing).
    pub fn with_timeout(user_agent: &str, timeout: Duration) -> SchedulerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            // A redirect response is itself the outcome of the check.
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(user_agent)
            .build()
            .map_err(|e| SchedulerError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `url` once. Never fails: every error becomes a down record.
    pub async fn probe(&self, monitor_id: MonitorId, url: &str) -> NewHealthRecord {
        let start = Instant::now();
        let result = self.client.get(url).send().await;
        let latency_ms = round_latency_ms(start.elapsed());
        let checked_at = Utc::now();

        match result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                debug!(monitor_id, %url, status_code, latency_ms, "probe got response");
                NewHealthRecord::response(monitor_id, status_code, latency_ms, checked_at)
            }
            Err(e) => {
                let message = describe_error(&e, self.timeout);
                debug!(monitor_id, %url, error = %message, latency_ms, "probe failed");
                NewHealthRecord::failure(monitor_id, message, latency_ms, checked_at)
            }
        }
    }
}

/// Elapsed time in milliseconds, rounded to two decimals.
pub fn round_latency_ms(elapsed: Duration) -> f64 {
    // Microseconds / 10 = hundredths of a millisecond.
    (elapsed.as_micros() as f64 / 10.0).round() / 100.0
}

/// Flatten a request error and its causes into one readable line.
fn describe_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        return format!("request timed out after {timeout:?}");
    }

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prober() -> Prober {
        Prober::with_timeout("urlwatch-test", Duration::from_millis(500)).unwrap()
    }

    #[test]
    fn latency_rounds_to_two_decimals() {
        assert_eq!(round_latency_ms(Duration::from_micros(12_346)), 12.35);
        assert_eq!(round_latency_ms(Duration::from_micros(12_344)), 12.34);
        assert_eq!(round_latency_ms(Duration::from_secs(2)), 2000.0);
        assert_eq!(round_latency_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn default_timeout_is_fixed() {
        let prober = Prober::new("urlwatch-test").unwrap();
        assert_eq!(prober.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn probe_to_closed_port_records_failure() {
        // Nothing listens on port 1.
        let record = prober().probe(7, "http://127.0.0.1:1/").await;

        assert_eq!(record.monitor_id, 7);
        assert!(!record.is_up);
        assert!(record.status_code.is_none());
        assert!(!record.error_message.unwrap().is_empty());
        assert!(record.latency_ms >= 0.0);
    }

    #[tokio::test]
    async fn probe_malformed_target_records_failure() {
        let record = prober().probe(3, "not a url").await;

        assert!(!record.is_up);
        assert!(record.status_code.is_none());
        assert!(!record.error_message.unwrap().is_empty());
    }
}
