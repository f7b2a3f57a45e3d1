//! Four-line sequence records.
//!
//! A record is read and written as one unit: identifier, sequence,
//! separator and quality, each on its own line. The separator line is
//! carried through untouched so files round-trip byte for byte.

use std::cmp::Ordering;
use std::io::{BufRead, Write};
use std::path::Path;

use bio::alphabets::dna;

use crate::error::{EvalError, Result};
use crate::io_utils::open_input;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub seq: String,
    pub sep: String,
    pub qual: String,
}

impl Record {
    pub fn new(id: &str, seq: &str, sep: &str, qual: &str) -> Self {
        Record {
            id: id.to_string(),
            seq: seq.to_string(),
            sep: sep.to_string(),
            qual: qual.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Generation-order key assigned by the read simulator.
    ///
    /// Takes the last `_`-delimited token of the identifier, drops its
    /// two-character mate marker (`/1`, `/2`) and parses the rest as a
    /// decimal integer: `@chr1_511_1022_0_1_0_0_42/1` has key 42.
    pub fn order_key(&self) -> Result<u64> {
        let bad = || EvalError::OrderKey {
            id: self.id.clone(),
        };
        let token = self.id.rsplit('_').next().ok_or_else(bad)?;
        let end = token.len().checked_sub(2).ok_or_else(bad)?;
        token
            .get(..end)
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(bad)
    }

    fn validate(&self, line: usize) -> Result<()> {
        let fail = |msg: String| Err(EvalError::InvalidRecord { line, msg });
        if !self.id.starts_with('@') {
            return fail(format!("identifier '{}' does not start with '@'", self.id));
        }
        if !self.sep.starts_with('+') {
            return fail(format!("separator '{}' does not start with '+'", self.sep));
        }
        if self.seq.len() != self.qual.len() {
            return fail(format!(
                "sequence length {} differs from quality length {}",
                self.seq.len(),
                self.qual.len()
            ));
        }
        if !dna::n_alphabet().is_word(self.seq.as_bytes()) {
            return fail(format!("sequence of '{}' has non-ACGTN symbols", self.id));
        }
        Ok(())
    }
}

/// Compares two records by their generation-order key.
pub fn compare(a: &Record, b: &Record) -> Result<Ordering> {
    Ok(a.order_key()?.cmp(&b.order_key()?))
}

/// Writes `rec` as four newline-terminated lines.
pub fn write_record<W: Write>(w: &mut W, rec: &Record) -> std::io::Result<()> {
    writeln!(w, "{}", rec.id)?;
    writeln!(w, "{}", rec.seq)?;
    writeln!(w, "{}", rec.sep)?;
    writeln!(w, "{}", rec.qual)
}

/// Pulls records off a line-oriented stream.
pub struct RecordReader<R: BufRead> {
    inner: R,
    line: usize,
    strict: bool,
    buf: String,
}

impl RecordReader<Box<dyn BufRead>> {
    /// Opens a (possibly compressed) record file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(RecordReader::new(open_input(path)?))
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        RecordReader {
            inner,
            line: 0,
            strict: false,
            buf: String::new(),
        }
    }

    /// Rejects malformed records instead of passing them through.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reads the next record, `None` at end of stream.
    ///
    /// An empty identifier line also ends the stream. A stream that stops
    /// after the identifier but before the quality line is an error.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let start = self.line + 1;
        let id = match self.next_line()? {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };
        let mut rest = [String::new(), String::new(), String::new()];
        for slot in rest.iter_mut() {
            *slot = self
                .next_line()?
                .ok_or(EvalError::TruncatedRecord { line: self.line + 1 })?;
        }
        let [seq, sep, qual] = rest;
        let rec = Record { id, seq, sep, qual };
        if self.strict {
            rec.validate(start)?;
        }
        Ok(Some(rec))
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.inner.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        let trimmed = self
            .buf
            .strip_suffix('\n')
            .map(|s| s.strip_suffix('\r').unwrap_or(s))
            .unwrap_or(self.buf.as_str());
        Ok(Some(trimmed.to_string()))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> RecordReader<Cursor<Vec<u8>>> {
        RecordReader::new(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn write_then_read_preserves_every_field() -> Result<()> {
        let recs = vec![
            Record::new("@sim_0_0_7/1", "ACGTN", "+sim_0_0_7/1", "II#II"),
            Record::new("@sim_0_0_8/1", "", "+", ""),
        ];
        let mut out = Vec::new();
        for r in &recs {
            write_record(&mut out, r)?;
        }
        let back: Vec<Record> = RecordReader::new(Cursor::new(out)).collect::<Result<_>>()?;
        assert_eq!(back, recs);
        Ok(())
    }

    #[test]
    fn crlf_terminators_are_stripped() -> Result<()> {
        let mut r = reader("@a_1/1\r\nACGT\r\n+\r\nIIII\r\n");
        let rec = r.read_record()?.expect("one record");
        assert_eq!(rec, Record::new("@a_1/1", "ACGT", "+", "IIII"));
        assert!(r.read_record()?.is_none());
        Ok(())
    }

    #[test]
    fn blank_identifier_line_ends_stream() -> Result<()> {
        let mut r = reader("@a_1/1\nA\n+\nI\n\n@b_2/1\nA\n+\nI\n");
        assert!(r.read_record()?.is_some());
        assert!(r.read_record()?.is_none());
        Ok(())
    }

    #[test]
    fn truncated_record_is_an_error() {
        let mut r = reader("@a_1/1\nACGT\n+\n");
        match r.read_record() {
            Err(EvalError::TruncatedRecord { line }) => assert_eq!(line, 4),
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn permissive_mode_accepts_length_mismatch() -> Result<()> {
        let mut r = reader("@a_1/1\nACGT\n+\nII\n");
        assert_eq!(r.read_record()?.map(|rec| rec.len()), Some(4));
        Ok(())
    }

    #[test]
    fn strict_mode_rejects_malformed_records() {
        let cases = [
            "@a_1/1\nACGT\n+\nII\n",
            "a_1/1\nACGT\n+\nIIII\n",
            "@a_1/1\nACGT\n-\nIIII\n",
            "@a_1/1\nACXT\n+\nIIII\n",
        ];
        for text in cases {
            let mut r = reader(text).strict(true);
            assert!(
                matches!(r.read_record(), Err(EvalError::InvalidRecord { line: 1, .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn order_key_strips_mate_marker() -> Result<()> {
        let rec = Record::new("@chr1_511_1022_0_1_0_0_42/1", "", "+", "");
        assert_eq!(rec.order_key()?, 42);
        let bad = Record::new("@read/1", "", "+", "");
        assert!(matches!(bad.order_key(), Err(EvalError::OrderKey { .. })));
        Ok(())
    }

    #[test]
    fn compare_is_numeric_not_lexical() -> Result<()> {
        let nine = Record::new("@x_9/1", "", "+", "");
        let ten = Record::new("@x_10/1", "", "+", "");
        assert_eq!(compare(&nine, &ten)?, Ordering::Less);
        assert_eq!(compare(&ten, &nine)?, Ordering::Greater);
        assert_eq!(compare(&ten, &ten)?, Ordering::Equal);
        Ok(())
    }
}
