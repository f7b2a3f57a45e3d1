use std::path::Path;

use log::{debug, info};

use crate::error::Result;
use crate::io_utils::create_output;
use crate::record::{write_record, Record, RecordReader};

/// Restores generation order of a record file.
///
/// The whole input is held in memory and sorted (stably) by
/// [`Record::order_key`] before anything is written, so a failure never
/// leaves a partial output behind. Returns the number of records written.
pub fn sort_stream<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<usize> {
    let (input, output) = (input.as_ref(), output.as_ref());
    debug!("sorting {} into {}", input.display(), output.display());

    let mut keyed: Vec<(u64, Record)> = Vec::new();
    for rec in RecordReader::from_path(input)? {
        let rec = rec?;
        keyed.push((rec.order_key()?, rec));
    }
    keyed.sort_by_key(|(key, _)| *key);

    let mut w = create_output(output)?;
    for (_, rec) in &keyed {
        write_record(&mut w, rec)?;
    }
    w.finish()?;

    info!("sorted {} records from {}", keyed.len(), input.display());
    Ok(keyed.len())
}

#[cfg(test)]
mod tests {
    use super::sort_stream;
    use crate::error::EvalError;
    use crate::record::{compare, Record, RecordReader};
    use std::cmp::Ordering;
    use std::fs;
    use tempfile::tempdir;

    const SHUFFLED: &str = "\
@sim_3/1\nAAA\n+\nIII\n\
@sim_10/1\nCCC\n+\nIII\n\
@sim_1/1\nGGG\n+\nIII\n\
@sim_2/1\nTT\n+\nII\n";

    fn ids(path: &std::path::Path) -> Vec<String> {
        RecordReader::from_path(path)
            .unwrap()
            .map(|r| r.unwrap().id)
            .collect()
    }

    #[test]
    fn orders_by_numeric_suffix() -> Result<(), Box<dyn std::error::Error>> {
        let td = tempdir()?;
        let input = td.path().join("in.fq");
        let output = td.path().join("out.fq");
        fs::write(&input, SHUFFLED)?;

        assert_eq!(sort_stream(&input, &output)?, 4);
        assert_eq!(ids(&output), ["@sim_1/1", "@sim_2/1", "@sim_3/1", "@sim_10/1"]);

        let recs: Vec<Record> = RecordReader::from_path(&output)?.collect::<Result<_, _>>()?;
        for pair in recs.windows(2) {
            assert_ne!(compare(&pair[0], &pair[1])?, Ordering::Greater);
        }
        Ok(())
    }

    #[test]
    fn sorting_twice_changes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let td = tempdir()?;
        let input = td.path().join("in.fq");
        let once = td.path().join("once.fq");
        let twice = td.path().join("twice.fq");
        fs::write(&input, SHUFFLED)?;

        sort_stream(&input, &once)?;
        sort_stream(&once, &twice)?;
        assert_eq!(fs::read(&once)?, fs::read(&twice)?);
        Ok(())
    }

    #[test]
    fn equal_keys_keep_input_order() -> Result<(), Box<dyn std::error::Error>> {
        let td = tempdir()?;
        let input = td.path().join("in.fq");
        let output = td.path().join("out.fq");
        fs::write(&input, "@b_5/1\nA\n+\nI\n@a_5/2\nC\n+\nI\n@c_4/1\nG\n+\nI\n")?;

        sort_stream(&input, &output)?;
        assert_eq!(ids(&output), ["@c_4/1", "@b_5/1", "@a_5/2"]);
        Ok(())
    }

    #[test]
    fn missing_input_is_not_found_and_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let td = tempdir()?;
        let output = td.path().join("out.fq");
        match sort_stream(td.path().join("absent.fq"), &output) {
            Err(EvalError::Open { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("expected not-found, got {other:?}"),
        }
        assert!(!output.exists());
        Ok(())
    }
}
