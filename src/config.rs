use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Rates handed to a paired-end trimmer by whoever runs it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonRates {
    pub match_rate: f64,
    pub sequence_compare_rate: f64,
    pub adapter_compare_rate: f64,
}

impl Default for ComparisonRates {
    fn default() -> Self {
        ComparisonRates {
            match_rate: 0.7,
            sequence_compare_rate: 0.9,
            adapter_compare_rate: 0.8,
        }
    }
}

/// Settings for one evaluation session. Built once and passed to the
/// components that need it; nothing here is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trimmer executable the external runner launched. Recorded in reports.
    pub executable_path: Option<PathBuf>,
    pub thread_count: usize,
    /// Length filter threshold for batch runs; 0 disables filtering.
    pub minimum_length: usize,
    pub comparison_rates: ComparisonRates,
    pub read_length: usize,
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            executable_path: None,
            thread_count: 1,
            minimum_length: 0,
            comparison_rates: ComparisonRates::default(),
            read_length: 100,
            strict: false,
        }
    }
}

impl Config {
    /// Loads a JSON config file. Missing keys take their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EvalError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(EvalError::Config("thread_count must be at least 1".into()));
        }
        if self.read_length == 0 {
            return Err(EvalError::Config("read_length must be positive".into()));
        }
        Ok(())
    }
}
