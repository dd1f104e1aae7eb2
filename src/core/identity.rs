//! Pairwise percent identity over a fixed alignment.
//!
//! Identity between two aligned rows is the number of matching columns divided
//! by the number of columns where at least one row has a residue. Columns
//! gapped in both rows carry no information and are skipped entirely.
//!
//! [`IdentityMatrix`] caches the value for every unordered pair in a condensed
//! lower triangle, so storage is n(n-1)/2 cells and each pair is scored once.

use crate::bio::msa::Alignment;
use crate::bio::sequence::Sequence;
use crate::KerfError;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

pub const DEFAULT_GAP: u8 = b'-';

/// Percent identity of two aligned rows, in `[0, 1]`.
pub fn percent_identity(lhs: &Sequence, rhs: &Sequence, gap: u8) -> Result<f64, KerfError> {
    if lhs.len() != rhs.len() {
        return Err(KerfError::MismatchedLength {
            id: rhs.id.clone(),
            expected: lhs.len(),
            found: rhs.len(),
        });
    }

    let mut numerator = 0usize;
    let mut denominator = 0usize;
    for (&l, &r) in lhs.sequence.iter().zip(rhs.sequence.iter()) {
        if l != gap || r != gap {
            denominator += 1;
            if l == r {
                numerator += 1;
            }
        }
    }

    if denominator == 0 {
        return Err(KerfError::DegeneratePair {
            lhs: lhs.id.clone(),
            rhs: rhs.id.clone(),
        });
    }

    Ok(numerator as f64 / denominator as f64)
}

#[derive(Debug, Clone)]
pub struct IdentityMatrix {
    size: usize,
    /// Row-major lower triangle: cell (row, col) with row > col.
    values: Vec<f64>,
}

#[inline]
fn triangle_offset(row: usize) -> usize {
    row * row.saturating_sub(1) / 2
}

impl IdentityMatrix {
    /// Score every pair of the alignment, in parallel on the rayon pool.
    pub fn build(alignment: &Alignment, gap: u8) -> Result<Self, KerfError> {
        Self::build_with(alignment, gap, true, false)
    }

    /// Score every pair, choosing parallel or sequential evaluation and
    /// whether to draw a progress bar.
    pub fn build_with(
        alignment: &Alignment,
        gap: u8,
        parallel: bool,
        show_progress: bool,
    ) -> Result<Self, KerfError> {
        let records = alignment.records();
        let size = records.len();

        let pb = if show_progress {
            let pb = ProgressBar::new(size as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} Scoring identity rows")
                    .unwrap()
                    .progress_chars("##-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let score_row = |row: usize| -> Result<Vec<f64>, KerfError> {
            let cells = (0..row)
                .map(|col| percent_identity(&records[row], &records[col], gap))
                .collect::<Result<Vec<_>, _>>();
            pb.inc(1);
            cells
        };

        // Rows are independent; a final gather in row order keeps the
        // condensed layout deterministic.
        let rows: Vec<Vec<f64>> = if parallel {
            (0..size).into_par_iter().map(score_row).collect::<Result<_, _>>()?
        } else {
            (0..size).map(score_row).collect::<Result<_, _>>()?
        };
        pb.finish_and_clear();

        let values: Vec<f64> = rows.into_iter().flatten().collect();
        info!(
            "Computed {} pairwise identities for {} sequences",
            values.len(),
            size
        );

        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Cached identity of sequences `i` and `j`, in either order.
    pub fn pairwise(&self, i: usize, j: usize) -> Result<f64, KerfError> {
        for index in [i, j] {
            if index >= self.size {
                return Err(KerfError::IndexOutOfRange {
                    index,
                    size: self.size,
                });
            }
        }
        if i == j {
            return Err(KerfError::SelfIdentity(i));
        }
        let (row, col) = if i > j { (i, j) } else { (j, i) };
        Ok(self.values[triangle_offset(row) + col])
    }

    /// Sum of identities of `i` with every other sequence.
    pub fn weight(&self, i: usize) -> Result<f64, KerfError> {
        let mut sum = 0.0;
        for k in (0..self.size).filter(|&k| k != i) {
            sum += self.pairwise(i, k)?;
        }
        Ok(sum)
    }

    /// Row sums for every index, the initial traversal weights.
    pub fn weights(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.size];
        for row in 1..self.size {
            let offset = triangle_offset(row);
            for col in 0..row {
                let value = self.values[offset + col];
                sums[row] += value;
                sums[col] += value;
            }
        }
        sums
    }

    /// Expand into a full square matrix with 1.0 on the diagonal.
    pub fn to_square(&self) -> Vec<Vec<f64>> {
        (0..self.size)
            .map(|i| {
                (0..self.size)
                    .map(|j| if i == j { 1.0 } else { self.values[triangle_offset(i.max(j)) + i.min(j)] })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(id: &str, s: &str) -> Sequence {
        Sequence::new(id.to_string(), s.as_bytes().to_vec())
    }

    fn alignment(rows: &[&str]) -> Alignment {
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, r)| seq(&format!("grp|S{}", i + 1), r))
            .collect();
        Alignment::new(records, "test").unwrap()
    }

    #[test]
    fn test_reference_identities() {
        let s1 = seq("S1", "ACGT");
        let s2 = seq("S2", "ACGA");
        let s3 = seq("S3", "TTTT");
        assert_eq!(percent_identity(&s1, &s2, b'-').unwrap(), 0.75);
        assert_eq!(percent_identity(&s1, &s3, b'-').unwrap(), 0.25);
        assert_eq!(percent_identity(&s2, &s3, b'-').unwrap(), 0.0);
    }

    #[test]
    fn test_double_gaps_excluded_single_gaps_counted() {
        let a = seq("a", "AC--T");
        let b = seq("b", "A-G-T");
        // columns: A/A match, C/- counted, -/G counted, -/- skipped, T/T match
        assert_eq!(percent_identity(&a, &b, b'-').unwrap(), 0.5);
        assert_eq!(percent_identity(&a, &a, b'-').unwrap(), 1.0);
    }

    #[test]
    fn test_degenerate_pair_is_error() {
        let a = seq("a", "--");
        let b = seq("b", "--");
        match percent_identity(&a, &b, b'-') {
            Err(KerfError::DegeneratePair { lhs, rhs }) => {
                assert_eq!(lhs, "a");
                assert_eq!(rhs, "b");
            }
            other => panic!("expected degenerate pair, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_gap_symbol() {
        let a = seq("a", "A..C");
        let b = seq("b", "A.-C");
        // '.' as gap: column 3 is '.'/'-', counted as a mismatch
        assert_eq!(percent_identity(&a, &b, b'.').unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn test_matrix_is_symmetric_and_cached() {
        let aln = alignment(&["ACGT", "ACGA", "TTTT"]);
        let m = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        assert_eq!(m.size(), 3);
        for (i, j, expected) in [(0, 1, 0.75), (0, 2, 0.25), (1, 2, 0.0)] {
            assert_eq!(m.pairwise(i, j).unwrap(), expected);
            assert_eq!(m.pairwise(j, i).unwrap(), expected);
        }
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let aln = alignment(&["ACGTAC", "ACG-AC", "TTTTAC", "A-GTTC", "ACGTAA"]);
        let par = IdentityMatrix::build_with(&aln, DEFAULT_GAP, true, false).unwrap();
        let seq = IdentityMatrix::build_with(&aln, DEFAULT_GAP, false, false).unwrap();
        assert_eq!(par.to_square(), seq.to_square());
    }

    #[test]
    fn test_lookup_violations() {
        let aln = alignment(&["ACGT", "ACGA"]);
        let m = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        assert!(matches!(m.pairwise(1, 1), Err(KerfError::SelfIdentity(1))));
        assert!(matches!(
            m.pairwise(0, 2),
            Err(KerfError::IndexOutOfRange { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_weights_are_row_sums() {
        let aln = alignment(&["ACGT", "ACGA", "TTTT"]);
        let m = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        let weights = m.weights();
        assert_eq!(weights, vec![1.0, 0.75, 0.25]);
        for (i, w) in weights.iter().enumerate() {
            assert!((m.weight(i).unwrap() - w).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_pair_aborts_build() {
        let aln = alignment(&["--", "AC", "--"]);
        let err = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap_err();
        assert!(matches!(err, KerfError::DegeneratePair { .. }));
    }

    #[test]
    fn test_single_sequence_matrix() {
        let aln = alignment(&["ACGT"]);
        let m = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        assert_eq!(m.weights(), vec![0.0]);
        assert_eq!(m.weight(0).unwrap(), 0.0);
    }
}
