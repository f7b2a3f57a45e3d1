use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::evaluate::{Confusion, Evaluation, TrimMagnitude};
use crate::metrics::{reduce, Metrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Single,
    Paired,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Single => write!(f, "SE"),
            Mode::Paired => write!(f, "PE"),
        }
    }
}

/// Everything one trimmer run is scored on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub mode: Mode,
    pub confusion: Confusion,
    pub magnitude: TrimMagnitude,
    pub metrics: Metrics,
}

impl Report {
    pub fn new(name: &str, mode: Mode, eval: Evaluation) -> Self {
        Report {
            name: name.to_string(),
            mode,
            confusion: eval.confusion,
            magnitude: eval.magnitude,
            metrics: reduce(&eval.confusion),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.confusion;
        let m = &self.metrics;
        writeln!(f, "== {} ({}) ==", self.name, self.mode)?;
        writeln!(f, "[TP, TN, FP, FN]: {}, {}, {}, {}", c.tp, c.tn, c.fp, c.fn_)?;
        writeln!(f, "ACC: {:.6}", m.acc)?;
        writeln!(f, "SEN: {:.6}", m.sen)?;
        writeln!(f, "SPC: {:.6}", m.spc)?;
        writeln!(f, "PPV: {:.6}", m.ppv)?;
        writeln!(f, "MCC: {:.6}", m.mcc)?;
        writeln!(f, "overtrim bases: {}", self.magnitude.overtrim)?;
        write!(f, "undertrim bases: {}", self.magnitude.undertrim)
    }
}

/// Writes `value` as pretty-printed JSON.
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| EvalError::Open {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Report {
        let eval = Evaluation {
            confusion: Confusion::new(7, 90, 2, 1),
            magnitude: TrimMagnitude {
                overtrim: 12,
                undertrim: 3,
            },
        };
        Report::new("cutadapt", Mode::Single, eval)
    }

    #[test]
    fn display_lists_counts_and_metrics() {
        let text = sample().to_string();
        assert!(text.starts_with("== cutadapt (SE) =="));
        assert!(text.contains("[TP, TN, FP, FN]: 7, 90, 2, 1"));
        assert!(text.contains("ACC: 0.970000"));
        assert!(text.contains("overtrim bases: 12"));
    }

    #[test]
    fn json_uses_plain_field_names() -> Result<()> {
        let td = tempdir()?;
        let path = td.path().join("report.json");
        write_json(&sample(), &path)?;

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(value["mode"], "single");
        assert_eq!(value["confusion"]["fn"], 1);
        assert_eq!(value["magnitude"]["overtrim"], 12);

        let back: Report = serde_json::from_value(value)?;
        assert_eq!(back.confusion, sample().confusion);
        assert_eq!(back.mode, Mode::Single);
        Ok(())
    }
}
