//! Fixed-cooldown retry for transient Overpass overload.

use std::thread;
use std::time::Duration;

use tracing::warn;

use super::client::OverpassError;
use crate::config::{DEFAULT_MAX_ATTEMPTS, WAITING_TIME};

/// Retry policy for a single query: sleep a fixed cooldown after each
/// transient error, up to `max_attempts` total attempts.
///
/// The reference pipeline this replaces retried forever with the same fixed
/// cooldown. The attempt cap is a deliberate divergence so that a permanently
/// overloaded endpoint surfaces as [`OverpassError::RetriesExhausted`] instead
/// of blocking the process for good; the default cap still allows roughly a
/// day of cooldowns.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub cooldown: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            cooldown: WAITING_TIME,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails non-transiently, or the attempt cap
    /// is hit. The cooldown blocks the calling thread; the whole pipeline is
    /// synchronous and that is intended.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, OverpassError>,
    ) -> Result<T, OverpassError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempts < self.max_attempts => {
                    warn!(
                        attempt = attempts,
                        cooldown_secs = self.cooldown.as_secs(),
                        error = %err,
                        "overpass overloaded, waiting before retry"
                    );
                    thread::sleep(self.cooldown);
                }
                Err(err) if err.is_transient() => {
                    return Err(OverpassError::RetriesExhausted {
                        attempts,
                        source: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
