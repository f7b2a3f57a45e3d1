//! Scoring several trimmers against one simulated data set.
//!
//! A manifest names the answer file(s) and, per trimmer, the output
//! file(s) it produced. Each run is prepared (optionally sorted back into
//! generation order and length-filtered), evaluated and reduced. Runs are
//! independent and execute on a rayon pool sized by `thread_count`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ComparisonRates, Config};
use crate::error::{EvalError, Result};
use crate::evaluate::Evaluator;
use crate::filter::filter_min_length;
use crate::report::{Mode, Report};
use crate::sort::sort_stream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// One answer file for single-end data, two for paired-end.
    pub answers: Vec<PathBuf>,
    pub runs: Vec<Run>,
}

impl Manifest {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| EvalError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn mode(&self) -> Result<Mode> {
        match self.answers.len() {
            1 => Ok(Mode::Single),
            2 => Ok(Mode::Paired),
            n => Err(EvalError::FileCount(n)),
        }
    }
}

/// One trimmer's output to score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub name: String,
    pub outputs: Vec<PathBuf>,
    /// Restore generation order first; the sorted copy is written next to
    /// each output as `<output>.sorted`.
    #[serde(default)]
    pub sort: bool,
    /// Overrides the configured minimum length. The filter rewrites the
    /// (sorted) output in place.
    #[serde(default)]
    pub min_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub executable_path: Option<PathBuf>,
    pub comparison_rates: ComparisonRates,
    pub read_length: usize,
    pub reports: Vec<Report>,
    /// Runs whose output files were not there.
    pub skipped: Vec<String>,
    pub failures: Vec<Failure>,
}

/// Scores every run in `manifest`. A failing run is recorded and does not
/// stop the others.
pub fn run(manifest: &Manifest, config: &Config) -> Result<BatchReport> {
    config.validate()?;
    let mode = manifest.mode()?;
    let evaluator = Evaluator::from_config(config);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.thread_count)
        .build()?;

    info!(
        "scoring {} runs on {} threads",
        manifest.runs.len(),
        config.thread_count
    );
    let outcomes: Vec<Result<Option<Report>>> = pool.install(|| {
        manifest
            .runs
            .par_iter()
            .map(|r| score(r, &manifest.answers, mode, config, &evaluator))
            .collect()
    });

    let mut batch = BatchReport {
        executable_path: config.executable_path.clone(),
        comparison_rates: config.comparison_rates,
        read_length: config.read_length,
        reports: Vec::new(),
        skipped: Vec::new(),
        failures: Vec::new(),
    };
    for (r, outcome) in manifest.runs.iter().zip(outcomes) {
        match outcome {
            Ok(Some(report)) => batch.reports.push(report),
            Ok(None) => batch.skipped.push(r.name.clone()),
            Err(e) => {
                error!("{}: {e}", r.name);
                batch.failures.push(Failure {
                    name: r.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(batch)
}

fn score(
    run: &Run,
    answers: &[PathBuf],
    mode: Mode,
    config: &Config,
    evaluator: &Evaluator,
) -> Result<Option<Report>> {
    if run.outputs.len() != answers.len() {
        return Err(EvalError::FileCount(run.outputs.len()));
    }
    if let Some(missing) = run.outputs.iter().find(|p| !p.is_file()) {
        warn!("{}: {} not found, skipping", run.name, missing.display());
        return Ok(None);
    }

    let mut files = run.outputs.clone();
    if run.sort {
        for f in files.iter_mut() {
            let sorted = sorted_path(f);
            sort_stream(&*f, &sorted)?;
            *f = sorted;
        }
    }

    let min_length = run.min_length.unwrap_or(config.minimum_length);
    if min_length > 0 {
        filter_min_length(&files, min_length)?;
    }

    let eval = match mode {
        Mode::Single => evaluator.single_end(&files[0], &answers[0])?,
        Mode::Paired => {
            evaluator.paired_end([&files[0], &files[1]], [&answers[0], &answers[1]])?
        }
    };
    Ok(Some(Report::new(&run.name, mode, eval)))
}

fn sorted_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".sorted");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::Confusion;
    use tempfile::tempdir;

    fn fastq(records: &[(&str, usize)]) -> String {
        records
            .iter()
            .map(|(id, len)| format!("@{id}\n{}\n+\n{}\n", "A".repeat(*len), "I".repeat(*len)))
            .collect()
    }

    fn run(name: &str, outputs: Vec<PathBuf>) -> Run {
        Run {
            name: name.to_string(),
            outputs,
            sort: false,
            min_length: None,
        }
    }

    #[test]
    fn single_end_batch_scores_sorts_and_skips() -> Result<()> {
        let td = tempdir()?;
        let answer = td.path().join("ans.fq");
        fs::write(&answer, fastq(&[("s_1/1", 100), ("s_2/1", 60), ("s_3/1", 0)]))?;

        let exact = td.path().join("exact.fq");
        fs::write(&exact, fastq(&[("s_1/1", 100), ("s_2/1", 60)]))?;
        let shuffled = td.path().join("shuffled.fq");
        fs::write(&shuffled, fastq(&[("s_2/1", 60), ("s_3/1", 12), ("s_1/1", 100)]))?;
        let stray = td.path().join("stray.fq");
        fs::write(&stray, fastq(&[("s_1/1", 100), ("x_9/1", 60)]))?;

        let mut sorted = run("shuffled", vec![shuffled.clone()]);
        sorted.sort = true;
        sorted.min_length = Some(20);
        let manifest = Manifest {
            answers: vec![answer],
            runs: vec![
                run("exact", vec![exact]),
                sorted,
                run("absent", vec![td.path().join("absent.fq")]),
                run("stray", vec![stray]),
            ],
        };
        let config = Config {
            thread_count: 2,
            executable_path: Some(PathBuf::from("/opt/trimmer")),
            ..Config::default()
        };

        let batch = super::run(&manifest, &config)?;
        assert_eq!(batch.reports.len(), 2);
        assert_eq!(batch.reports[0].name, "exact");
        assert_eq!(batch.reports[0].confusion, Confusion::new(2, 1, 0, 0));
        // s_3 is filtered out of the sorted copy, which is what the answer wants.
        assert_eq!(batch.reports[1].confusion, Confusion::new(2, 1, 0, 0));
        assert!(sorted_path(&shuffled).is_file());
        assert_eq!(batch.skipped, ["absent"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].name, "stray");
        assert_eq!(batch.executable_path, config.executable_path);
        Ok(())
    }

    #[test]
    fn paired_end_batch_uses_both_mates() -> Result<()> {
        let td = tempdir()?;
        let a1 = td.path().join("ans_1.fq");
        let a2 = td.path().join("ans_2.fq");
        fs::write(&a1, fastq(&[("p_1/1", 100), ("p_2/1", 70)]))?;
        fs::write(&a2, fastq(&[("p_1/2", 100), ("p_2/2", 70)]))?;
        let o1 = td.path().join("out_1.fq");
        let o2 = td.path().join("out_2.fq");
        fs::write(&o1, fastq(&[("p_1/1", 100), ("p_2/1", 75)]))?;
        fs::write(&o2, fastq(&[("p_1/2", 100), ("p_2/2", 70)]))?;

        let manifest = Manifest {
            answers: vec![a1, a2],
            runs: vec![run("pe", vec![o1, o2]), run("half", vec![td.path().join("x.fq")])],
        };
        let batch = super::run(&manifest, &Config::default())?;
        assert_eq!(batch.reports[0].mode, Mode::Paired);
        assert_eq!(batch.reports[0].confusion, Confusion::new(0, 1, 0, 1));
        assert_eq!(batch.failures[0].name, "half");
        Ok(())
    }

    #[test]
    fn three_answer_files_are_rejected() {
        let manifest = Manifest {
            answers: vec!["a".into(), "b".into(), "c".into()],
            runs: Vec::new(),
        };
        assert!(matches!(
            super::run(&manifest, &Config::default()),
            Err(EvalError::FileCount(3))
        ));
    }
}
