/// Run progress counters
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub wallets_total: usize,
    pub wallets_succeeded: usize,
    pub wallets_failed: usize,
    /// Mainnet endpoints recorded across all wallets
    pub endpoints_recorded: usize,
    pub last_error: Option<String>,
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn new(wallets_total: usize) -> Self {
        Self {
            wallets_total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, endpoints: usize) {
        self.wallets_succeeded += 1;
        self.endpoints_recorded += endpoints;
    }

    pub fn record_failure(&mut self, message: String) {
        self.wallets_failed += 1;
        self.last_error = Some(message);
    }

    /// Wallets that have been attempted so far.
    pub fn processed(&self) -> usize {
        self.wallets_succeeded + self.wallets_failed
    }
}
