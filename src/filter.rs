use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{EvalError, Result};
use crate::io_utils::{Codec, OutputWriter};
use crate::record::{write_record, Record, RecordReader};

/// Records (or pairs) seen and kept by one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub records_in: u64,
    pub records_kept: u64,
}

/// Rewrites one file, or a mate pair of files, in place without records
/// shorter than `min_length`.
///
/// For a pair, both mates are dropped when either is short, and the two
/// files must hold the same number of records. Output goes to a temporary
/// file next to each input and replaces it only after the whole pass
/// succeeds; on error the inputs are left untouched.
pub fn filter_min_length<P: AsRef<Path>>(paths: &[P], min_length: usize) -> Result<FilterStats> {
    let stats = match paths {
        [single] => filter_single(single.as_ref(), min_length)?,
        [first, second] => filter_paired(first.as_ref(), second.as_ref(), min_length)?,
        other => return Err(EvalError::FileCount(other.len())),
    };
    info!(
        "kept {} of {} records at minimum length {}",
        stats.records_kept, stats.records_in, min_length
    );
    Ok(stats)
}

fn filter_single(path: &Path, min_length: usize) -> Result<FilterStats> {
    let mut reader = RecordReader::from_path(path)?;
    let mut staged = Staged::new(path)?;
    let mut stats = FilterStats::default();

    while let Some(rec) = reader.read_record()? {
        stats.records_in += 1;
        if rec.len() < min_length {
            continue;
        }
        staged.write(&rec)?;
        stats.records_kept += 1;
    }

    staged.commit()?;
    Ok(stats)
}

fn filter_paired(first: &Path, second: &Path, min_length: usize) -> Result<FilterStats> {
    let mut r1 = RecordReader::from_path(first)?;
    let mut r2 = RecordReader::from_path(second)?;
    let mut s1 = Staged::new(first)?;
    let mut s2 = Staged::new(second)?;
    let mut stats = FilterStats::default();

    loop {
        match (r1.read_record()?, r2.read_record()?) {
            (Some(m1), Some(m2)) => {
                stats.records_in += 1;
                if m1.len() < min_length || m2.len() < min_length {
                    continue;
                }
                s1.write(&m1)?;
                s2.write(&m2)?;
                stats.records_kept += 1;
            }
            (None, None) => break,
            _ => {
                return Err(EvalError::UnequalPairCounts {
                    pairs: stats.records_in,
                })
            }
        }
    }

    s1.commit()?;
    s2.commit()?;
    Ok(stats)
}

/// Temporary sibling of a file being rewritten.
struct Staged {
    target: PathBuf,
    tmp: NamedTempFile,
    writer: OutputWriter,
}

impl Staged {
    fn new(target: &Path) -> Result<Self> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        let writer = OutputWriter::new(tmp.as_file().try_clone()?, Codec::detect(target)?)?;
        Ok(Staged {
            target: target.to_path_buf(),
            tmp,
            writer,
        })
    }

    fn write(&mut self, rec: &Record) -> Result<()> {
        Ok(write_record(&mut self.writer, rec)?)
    }

    fn commit(self) -> Result<()> {
        self.writer.finish()?;
        fs::set_permissions(self.tmp.path(), fs::metadata(&self.target)?.permissions())?;
        self.tmp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}
