use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deadlines and timeouts shared by the executors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Limit for a single read or submit round trip.
    pub call_timeout: Duration,
    /// How long to wait for a transaction to be mined.
    pub receipt_timeout: Duration,
    /// Seconds from now placed in quote and transaction deadlines.
    pub deadline_secs: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            receipt_timeout: Duration::from_secs(300),
            deadline_secs: 20 * 60,
        }
    }
}
