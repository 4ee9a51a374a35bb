//! Fraud heuristic thresholds.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudPolicy {
    /// Attempts from one IP (including the current one) that trigger `RapidRepeat`.
    pub rapid_repeat_threshold: usize,
    #[serde(with = "humantime_serde")]
    pub rapid_repeat_window: Duration,
    /// Not-found results from one IP that trigger `Enumeration`.
    pub enumeration_threshold: usize,
    #[serde(with = "humantime_serde")]
    pub enumeration_window: Duration,
    /// Distinct IPs checking one subject that trigger `DistributedProbing`.
    pub distinct_ip_threshold: usize,
    #[serde(with = "humantime_serde")]
    pub distinct_ip_window: Duration,
    /// Score at or above which an entry is marked suspicious.
    pub suspicious_threshold: u8,
    /// Entries kept in memory for queries and heuristics.
    pub max_entries: usize,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            rapid_repeat_threshold: 10,
            rapid_repeat_window: Duration::from_secs(60),
            enumeration_threshold: 5,
            enumeration_window: Duration::from_secs(600),
            distinct_ip_threshold: 20,
            distinct_ip_window: Duration::from_secs(3600),
            suspicious_threshold: 50,
            max_entries: 100_000,
        }
    }
}

impl FraudPolicy {
    /// Longest look-back any heuristic needs.
    pub fn max_window(&self) -> Duration {
        self.rapid_repeat_window
            .max(self.enumeration_window)
            .max(self.distinct_ip_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_window() {
        assert_eq!(FraudPolicy::default().max_window(), Duration::from_secs(3600));
    }
}
