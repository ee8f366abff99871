use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::model::UserType;

/// Tunables for the analyses.
///
/// Stored as a plain JSON object on disk; absent keys keep their defaults:
/// ```json
/// {
///   "customer_allowance_secs": 1800,
///   "subscriber_allowance_secs": 2700
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Free ride time for single-ride and day-pass customers.
    pub customer_allowance_secs: u32,
    /// Free ride time for annual members.
    pub subscriber_allowance_secs: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            customer_allowance_secs: 30 * 60,
            subscriber_allowance_secs: 45 * 60,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| AnalysisError::Config(format!("{path}: {e}")))
    }

    /// Time allowance for `user_type`; `None` for categories without a limit.
    pub fn allowance_for(&self, user_type: &UserType) -> Option<u32> {
        match user_type {
            UserType::Customer => Some(self.customer_allowance_secs),
            UserType::Subscriber => Some(self.subscriber_allowance_secs),
            UserType::Other(_) => None,
        }
    }
}
