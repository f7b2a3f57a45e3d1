//! Scoring adapter trimmers against simulated ground truth.
//!
//! A read simulator writes an "answer" file holding each read as it should
//! look after perfect adapter trimming. This crate compares a trimmer's
//! output with that answer, read by read, and reduces the comparison to
//! classification metrics (accuracy, sensitivity, specificity, precision,
//! MCC) and over/under-trimmed base counts. It also carries the two
//! preparation steps some trimmers need first: restoring generation order
//! and dropping short reads.

pub mod batch;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod io_utils;
pub mod metrics;
pub mod record;
pub mod report;
pub mod sort;

pub use config::Config;
pub use error::{EvalError, Result};
pub use evaluate::{Confusion, Evaluation, Evaluator, TrimMagnitude};
pub use metrics::{reduce, Metrics};
pub use record::{Record, RecordReader};
