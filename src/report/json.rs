use crate::report::SplitReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub index: usize,
    pub size: usize,
    pub seed: String,
    pub leaves: Vec<String>,
}

/// Machine-readable record of one split run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub cutoff: f64,
    pub policy: String,
    pub sequences: usize,
    pub linked_terminals: usize,
    pub unassigned: usize,
    pub clusters: Vec<ClusterSummary>,
}

impl RunSummary {
    pub fn from_report(report: &SplitReport) -> Self {
        let tree = report.partition.tree();
        let clusters = report
            .partition
            .iter()
            .map(|cluster| ClusterSummary {
                index: cluster.index,
                size: cluster.len(),
                seed: tree.name(cluster.seed).unwrap_or_default().to_string(),
                leaves: cluster.leaf_names(tree).into_iter().map(String::from).collect(),
            })
            .collect();

        let unassigned = report
            .assignments()
            .iter()
            .filter(|(_, a)| a.cluster().is_none())
            .count();

        Self {
            generated_at: Utc::now(),
            cutoff: report.partition.cutoff(),
            policy: report.policy.to_string(),
            sequences: report.alignment.len(),
            linked_terminals: report.correspondence.len(),
            unassigned,
            clusters,
        }
    }

    pub fn largest_cluster(&self) -> usize {
        self.clusters.iter().map(|c| c.size).max().unwrap_or(0)
    }

    pub fn singleton_count(&self) -> usize {
        self.clusters.iter().filter(|c| c.size == 1).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::msa::Alignment;
    use crate::bio::sequence::Sequence;
    use crate::bio::tree::newick::parse_newick;
    use crate::core::correspondence::{Correspondence, NameRule};
    use crate::core::identity::{IdentityMatrix, DEFAULT_GAP};
    use crate::core::selector::TraversalPolicy;
    use crate::core::splitter::split_tree;

    #[test]
    fn test_summary_fields() {
        let records = [("grp|S1", "ACGT"), ("grp|S2", "ACGA"), ("grp|S3", "TTTT")]
            .iter()
            .map(|(id, s)| Sequence::new(id.to_string(), s.as_bytes().to_vec()))
            .collect();
        let aln = Alignment::new(records, "test").unwrap();
        let tree = parse_newick("((S1_a,S2_a),S3_a);").unwrap();
        let map = Correspondence::build(&aln, &tree, &NameRule::default()).unwrap();
        let matrix = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        let partition = split_tree(tree, &map, &matrix, 0.5).unwrap();

        let report = SplitReport::new(&aln, &map, &partition, TraversalPolicy::Max);
        let summary = RunSummary::from_report(&report);
        assert_eq!(summary.sequences, 3);
        assert_eq!(summary.unassigned, 0);
        assert_eq!(summary.largest_cluster(), 2);
        assert_eq!(summary.singleton_count(), 1);
        assert_eq!(summary.clusters[0].seed, "S1_a");

        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["policy"], "max");
        assert_eq!(value["cutoff"], 0.5);
        assert_eq!(value["clusters"][0]["leaves"][1], "S2_a");
        assert!(value["generated_at"].is_string());
    }
}
