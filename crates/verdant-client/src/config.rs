//! client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use verdant_core::OperationHistory;

/// configuration for one ledger session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// target contract address
    pub contract: String,
    /// operation history cap
    pub history_capacity: usize,
    /// how long success notices stay visible
    pub success_notice_ttl: Duration,
    /// how long error notices stay visible
    pub error_notice_ttl: Duration,
}

impl ClientConfig {
    /// config for the given contract with stock timings
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            history_capacity: OperationHistory::DEFAULT_CAPACITY,
            success_notice_ttl: Duration::from_secs(2),
            error_notice_ttl: Duration::from_secs(3),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("0x0000000000000000000000000000000000000000")
    }
}
