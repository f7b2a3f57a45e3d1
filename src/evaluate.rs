//! Classification of trimmer output against simulator ground truth.
//!
//! Both evaluators walk the trimmer output and the answer file together.
//! The answer file holds every simulated read in generation order; the
//! output may be missing reads the trimmer discarded, but must never hold
//! a read the answer lacks. Each answer read lands in exactly one bucket:
//!
//! | answer vs. output length          | outcome |
//! |-----------------------------------|---------|
//! | both equal to the read length     | TN      |
//! | equal, shorter than the read      | TP      |
//! | output longer (adapter left in)   | FN      |
//! | output shorter (trimmed too far)  | FP      |
//! | read missing, answer empty        | TP      |
//! | read missing, answer non-empty    | FP      |

use std::io::BufRead;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{EvalError, Result};
use crate::record::{Record, RecordReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TruePositive,
    TrueNegative,
    FalsePositive,
    FalseNegative,
}

impl Outcome {
    fn classify(out_len: usize, ans_len: usize, read_length: usize) -> Self {
        if out_len == ans_len {
            if ans_len == read_length {
                Outcome::TrueNegative
            } else {
                Outcome::TruePositive
            }
        } else if out_len > ans_len {
            Outcome::FalseNegative
        } else {
            Outcome::FalsePositive
        }
    }

    /// Reads the trimmer never emitted: correct only if nothing should remain.
    fn omitted(ans_len: usize) -> Self {
        if ans_len == 0 {
            Outcome::TruePositive
        } else {
            Outcome::FalsePositive
        }
    }

    /// One outcome for a mate pair. TN needs both mates untouched; an
    /// over-trimmed mate outranks an under-trimmed one.
    fn joint(m1: Outcome, m2: Outcome) -> Self {
        use Outcome::*;
        match (m1, m2) {
            (TrueNegative, TrueNegative) => TrueNegative,
            (FalsePositive, _) | (_, FalsePositive) => FalsePositive,
            (FalseNegative, _) | (_, FalseNegative) => FalseNegative,
            _ => TruePositive,
        }
    }
}

/// Raw (TP, TN, FP, FN) counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl Confusion {
    pub fn new(tp: u64, tn: u64, fp: u64, fn_: u64) -> Self {
        Confusion { tp, tn, fp, fn_ }
    }

    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::TruePositive => self.tp += 1,
            Outcome::TrueNegative => self.tn += 1,
            Outcome::FalsePositive => self.fp += 1,
            Outcome::FalseNegative => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Over- and under-trimmed bases summed over a whole comparison.
///
/// The per-step length difference is taken between the current output
/// record and the current answer record before identifiers are matched,
/// so after a dropped read the two sides briefly belong to different
/// reads. Only the totals are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimMagnitude {
    pub overtrim: u64,
    pub undertrim: u64,
}

impl TrimMagnitude {
    fn drift(&mut self, ans_len: usize, out_len: usize) {
        if ans_len > out_len {
            self.overtrim += (ans_len - out_len) as u64;
        } else {
            self.undertrim += (out_len - ans_len) as u64;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub confusion: Confusion,
    pub magnitude: TrimMagnitude,
}

impl Evaluation {
    fn omit(&mut self, ans_len: usize) {
        self.magnitude.overtrim += ans_len as u64;
        self.confusion.add(Outcome::omitted(ans_len));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    read_length: usize,
    strict: bool,
}

impl Evaluator {
    pub fn new(read_length: usize) -> Self {
        Evaluator {
            read_length,
            strict: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Evaluator::new(config.read_length).strict(config.strict)
    }

    /// Validate every record read (see [`RecordReader::strict`]).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn open(&self, path: &Path) -> Result<RecordReader<Box<dyn BufRead>>> {
        Ok(RecordReader::from_path(path)?.strict(self.strict))
    }

    /// Compares a single-end trimmer output with its answer file.
    pub fn single_end<P: AsRef<Path>, Q: AsRef<Path>>(&self, output: P, answer: Q) -> Result<Evaluation> {
        let (output, answer) = (output.as_ref(), answer.as_ref());
        debug!("evaluating {} against {}", output.display(), answer.display());
        let eval = self.single_end_streams(self.open(output)?, self.open(answer)?)?;
        info!(
            "{}: {} answer reads classified",
            output.display(),
            eval.confusion.total()
        );
        Ok(eval)
    }

    pub fn single_end_streams<R1: BufRead, R2: BufRead>(
        &self,
        mut output: RecordReader<R1>,
        mut answer: RecordReader<R2>,
    ) -> Result<Evaluation> {
        let mut eval = Evaluation::default();
        let mut steps = 0u64;

        loop {
            let Some(out) = output.read_record()? else {
                break;
            };
            let Some(mut ans) = answer.read_record()? else {
                break;
            };
            steps += 1;
            eval.magnitude.drift(ans.len(), out.len());

            while out.id != ans.id {
                eval.omit(ans.len());
                ans = answer
                    .read_record()?
                    .ok_or_else(|| EvalError::UnknownIdentifier { id: out.id.clone() })?;
            }

            eval.confusion
                .add(Outcome::classify(out.len(), ans.len(), self.read_length));
        }

        if steps > 0 {
            while let Some(ans) = answer.read_record()? {
                eval.omit(ans.len());
            }
        }
        Ok(eval)
    }

    /// Compares paired-end trimmer output (mate 1, mate 2) with the two
    /// answer files. Each pair is one unit and counts once.
    pub fn paired_end<P: AsRef<Path>, Q: AsRef<Path>>(&self, outputs: [P; 2], answers: [Q; 2]) -> Result<Evaluation> {
        let [o1, o2] = outputs;
        let [a1, a2] = answers;
        debug!(
            "evaluating {} + {} against {} + {}",
            o1.as_ref().display(),
            o2.as_ref().display(),
            a1.as_ref().display(),
            a2.as_ref().display()
        );
        let eval = self.paired_end_streams(
            [self.open(o1.as_ref())?, self.open(o2.as_ref())?],
            [self.open(a1.as_ref())?, self.open(a2.as_ref())?],
        )?;
        info!(
            "{}: {} answer pairs classified",
            o1.as_ref().display(),
            eval.confusion.total()
        );
        Ok(eval)
    }

    pub fn paired_end_streams<R1: BufRead, R2: BufRead>(
        &self,
        output: [RecordReader<R1>; 2],
        answer: [RecordReader<R2>; 2],
    ) -> Result<Evaluation> {
        let mut output = PairReader::new(output);
        let mut answer = PairReader::new(answer);
        let mut eval = Evaluation::default();
        let mut steps = 0u64;

        loop {
            let Some([o1, o2]) = output.next_pair()? else {
                break;
            };
            let Some(mut ans) = answer.next_pair()? else {
                break;
            };
            steps += 1;
            eval.magnitude.drift(ans[0].len(), o1.len());
            eval.magnitude.drift(ans[1].len(), o2.len());

            while o1.id != ans[0].id {
                eval.omit(ans[0].len() + ans[1].len());
                ans = answer
                    .next_pair()?
                    .ok_or_else(|| EvalError::UnknownIdentifier { id: o1.id.clone() })?;
            }
            if o2.id != ans[1].id {
                return Err(EvalError::MateMismatch {
                    expected: ans[1].id.clone(),
                    found: o2.id,
                });
            }

            let m1 = Outcome::classify(o1.len(), ans[0].len(), self.read_length);
            let m2 = Outcome::classify(o2.len(), ans[1].len(), self.read_length);
            eval.confusion.add(Outcome::joint(m1, m2));
        }

        if steps > 0 {
            while let Some([a1, a2]) = answer.next_pair()? {
                eval.omit(a1.len() + a2.len());
            }
        }
        Ok(eval)
    }
}

/// Reads two mate files in lock-step.
struct PairReader<R: BufRead> {
    mates: [RecordReader<R>; 2],
    pairs: u64,
}

impl<R: BufRead> PairReader<R> {
    fn new(mates: [RecordReader<R>; 2]) -> Self {
        PairReader { mates, pairs: 0 }
    }

    fn next_pair(&mut self) -> Result<Option<[Record; 2]>> {
        let [m1, m2] = &mut self.mates;
        match (m1.read_record()?, m2.read_record()?) {
            (Some(r1), Some(r2)) => {
                self.pairs += 1;
                Ok(Some([r1, r2]))
            }
            (None, None) => Ok(None),
            _ => Err(EvalError::UnequalPairCounts { pairs: self.pairs }),
        }
    }
}
