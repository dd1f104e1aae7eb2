//! Validated multiple sequence alignment.
//!
//! An [`Alignment`] is never empty and every record has the same aligned
//! length, so downstream identity scoring can index columns without checks.

use crate::bio::fasta;
use crate::bio::sequence::Sequence;
use crate::KerfError;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Alignment {
    records: Vec<Sequence>,
    width: usize,
}

impl Alignment {
    /// Validate a set of records as one alignment.
    pub fn new(records: Vec<Sequence>, source: &str) -> Result<Self, KerfError> {
        let width = match records.first() {
            Some(first) => first.len(),
            None => return Err(KerfError::EmptyAlignment(source.to_string())),
        };

        if let Some(bad) = records.iter().find(|r| r.len() != width) {
            return Err(KerfError::MismatchedLength {
                id: bad.id.clone(),
                expected: width,
                found: bad.len(),
            });
        }

        debug!("Validated {} records of width {} from {}", records.len(), width, source);
        Ok(Self { records, width })
    }

    /// Load an aligned FASTA/A2M file (optionally gzipped).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, KerfError> {
        let path = path.as_ref();
        let records = fasta::parse_fasta(path)?;
        let alignment = Self::new(records, &path.display().to_string())?;
        info!(
            "Loaded {} aligned sequences ({} columns) from {}",
            alignment.len(),
            alignment.width(),
            path.display()
        );
        Ok(alignment)
    }

    pub fn records(&self) -> &[Sequence] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed alignment.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of aligned columns.
    pub fn width(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(id: &str, s: &str) -> Sequence {
        Sequence::new(id.to_string(), s.as_bytes().to_vec())
    }

    #[test]
    fn test_empty_alignment_rejected() {
        let err = Alignment::new(Vec::new(), "empty.a2m").unwrap_err();
        assert!(matches!(err, KerfError::EmptyAlignment(ref s) if s == "empty.a2m"));
    }

    #[test]
    fn test_mismatched_length_names_record() {
        let err = Alignment::new(vec![seq("a", "ACGT"), seq("b", "ACG")], "x").unwrap_err();
        match err {
            KerfError::MismatchedLength { id, expected, found } => {
                assert_eq!(id, "b");
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_valid_alignment() {
        let aln = Alignment::new(vec![seq("a", "AC-T"), seq("b", "ACGT")], "x").unwrap();
        assert_eq!(aln.len(), 2);
        assert_eq!(aln.width(), 4);
        assert_eq!(aln.get(1).map(|s| s.id.as_str()), Some("b"));
    }
}
