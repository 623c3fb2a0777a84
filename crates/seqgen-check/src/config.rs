//! Generation settings.
//!
//! Every field has a default, so a configuration file only needs to name
//! the settings it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::executor::Executor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Seed of the generator's PRNG.
    pub seed: u64,
    /// Stop after this many candidate sequences.
    pub input_limit: usize,
    /// Stop after this much wall-clock time; 0 disables the limit.
    pub time_limit_ms: u64,
    /// Candidate sequences longer than this are discarded.
    pub max_size: usize,
    /// Per-statement execution timeout; 0 runs statements inline without one.
    /// With a timeout every call, including the observer calls made while
    /// capturing regression values, runs on a freshly spawned thread.
    pub timeout_ms: u64,
    /// Probability of reusing a variable already in the sequence being built.
    pub alias_ratio: f64,
    /// Probability of passing `null` for a non-receiver reference input.
    pub null_ratio: f64,
    /// Minimise failing sequences before reporting them.
    pub simplify: bool,
    /// Apply object contracts after every statement instead of only the last.
    pub check_every_statement: bool,
    /// Treat a condition that throws as false instead of failing.
    pub ignore_condition_exception: bool,
    /// Drop specifications whose conditions do not compile instead of failing.
    pub ignore_condition_compilation_error: bool,
    /// Strings longer than this are not used as seeds or captured.
    pub string_max_len: usize,
    /// Test methods per generated JUnit class.
    pub tests_per_file: usize,
}

impl Default for GenConfig {
    fn default() -> Self {
        GenConfig {
            seed: 0,
            input_limit: 1000,
            time_limit_ms: 0,
            max_size: 100,
            timeout_ms: 5000,
            alias_ratio: 0.0,
            null_ratio: 0.05,
            simplify: true,
            check_every_statement: false,
            ignore_condition_exception: false,
            ignore_condition_compilation_error: false,
            string_max_len: 1000,
            tests_per_file: 500,
        }
    }
}

impl GenConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn time_limit(&self) -> Option<Duration> {
        (self.time_limit_ms > 0).then(|| Duration::from_millis(self.time_limit_ms))
    }

    pub fn executor(&self) -> Executor {
        Executor::new(self.timeout())
    }
}
