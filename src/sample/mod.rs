use crate::prob::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parsing of the textual (gender, height, weight) records.
mod record;

pub use record::*;

/// Aggregated sufficient statistics of a dataset: one count per fully observed
/// (gender, height, weight) combination and one count per (height, weight) combination
/// for records where gender is missing. Counts are never changed by the estimators,
/// which only borrow them, so many runs can share the same instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts {
    observed : [u64; N_FULL],
    missing : [u64; N_EFFECT],
    total : u64
}

impl Counts {

    /// Builds counts from already aggregated values; the total is their sum.
    pub fn new(observed : [u64; N_FULL], missing : [u64; N_EFFECT]) -> Self {
        let total = observed.iter().sum::<u64>() + missing.iter().sum::<u64>();
        Self { observed, missing, total }
    }

    /// Adds a single record to the matching bucket.
    pub fn observe(&mut self, record : &Record) {
        match record.full_combo() {
            Some(full) => self.observed[full] += 1,
            None => self.missing[record.effect_combo()] += 1
        }
        self.total += 1;
    }

    /// Reads one record per line. If skip_header is set, the first line is discarded
    /// regardless of its content. Blank lines are ignored.
    pub fn from_reader<R>(reader : R, skip_header : bool) -> Result<Self, RecordError>
    where
        R : BufRead
    {
        let mut counts = Counts::default();
        for (ix, line) in reader.lines().enumerate() {
            let line = line?;
            if skip_header && ix == 0 {
                continue;
            }
            if let Some(record) = Record::parse(&line, ix + 1)? {
                counts.observe(&record);
            }
        }
        Ok(counts)
    }

    pub fn from_path<P>(path : P, skip_header : bool) -> Result<Self, RecordError>
    where
        P : AsRef<Path>
    {
        let f = File::open(path)?;
        Self::from_reader(BufReader::new(f), skip_header)
    }

    pub fn observed(&self) -> &[u64; N_FULL] {
        &self.observed
    }

    pub fn missing(&self) -> &[u64; N_EFFECT] {
        &self.missing
    }

    /// Number of records (observed plus gender-missing).
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn n_missing(&self) -> u64 {
        self.missing.iter().sum()
    }

}

#[test]
fn aggregate() {
    let data = "gender height weight\n0 1 1\n1 0 0\n- 1 1\n\n0 1 1\n- 0 1\n";
    let counts = Counts::from_reader(data.as_bytes(), true).unwrap();
    assert_eq!(counts.observed(), &[0, 0, 0, 2, 1, 0, 0, 0]);
    assert_eq!(counts.missing(), &[0, 1, 0, 1]);
    assert_eq!(counts.total(), 5);
    assert_eq!(counts.n_missing(), 2);
}

#[test]
fn header_is_parsed_when_not_skipped() {
    let data = "0 1 1\n1 1 1\n";
    let counts = Counts::from_reader(data.as_bytes(), false).unwrap();
    assert_eq!(counts.total(), 2);
    assert!(Counts::from_reader("g h w\n".as_bytes(), false).is_err());
}

#[test]
fn total_invariant() {
    let counts = Counts::new([10, 5, 8, 2, 3, 12, 4, 9], [4, 1, 2, 3]);
    assert_eq!(counts.total(), 63);
    assert_eq!(
        counts.total(),
        counts.observed().iter().sum::<u64>() + counts.n_missing()
    );
}
