use crate::bio::fasta::write_fasta;
use crate::bio::msa::Alignment;
use crate::bio::sequence::Sequence;
use crate::bio::tree::newick::write_newick;
use crate::bio::tree::phyloxml::write_phyloxml;
use crate::bio::tree::Tree;
use crate::core::config::{OutputConfig, TreeFormat};
use crate::core::correspondence::Correspondence;
use crate::core::partition::{Assignment, Partition};
use crate::core::selector::TraversalPolicy;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod json;
pub mod text;

/// Everything a finished split produced, borrowed for reporting.
#[derive(Debug, Clone, Copy)]
pub struct SplitReport<'a> {
    pub alignment: &'a Alignment,
    pub correspondence: &'a Correspondence,
    pub partition: &'a Partition,
    pub policy: TraversalPolicy,
}

impl<'a> SplitReport<'a> {
    pub fn new(
        alignment: &'a Alignment,
        correspondence: &'a Correspondence,
        partition: &'a Partition,
        policy: TraversalPolicy,
    ) -> Self {
        Self {
            alignment,
            correspondence,
            partition,
            policy,
        }
    }

    /// `(sequence id, assignment)` for every alignment row, in input order.
    pub fn assignments(&self) -> Vec<(&'a str, Assignment)> {
        self.alignment
            .records()
            .iter()
            .map(|r| r.id.as_str())
            .zip(self.partition.assignments(self.correspondence))
            .collect()
    }

    /// Records retained by cluster `index`, in tree order.
    pub fn cluster_records(&self, index: usize) -> Vec<&'a Sequence> {
        let tree = self.partition.tree();
        self.partition
            .leaves_in_tree_order(index)
            .into_iter()
            .filter_map(|leaf| tree.name(leaf))
            .filter_map(|name| self.correspondence.index_of(name))
            .filter_map(|idx| self.alignment.get(idx))
            .collect()
    }
}

/// Writes the assignment table and per-cluster files for a split.
pub struct ResultWriter {
    options: OutputConfig,
}

impl ResultWriter {
    pub fn new(options: OutputConfig) -> Self {
        Self { options }
    }

    fn path(&self, file_name: String) -> PathBuf {
        self.options.directory.join(file_name)
    }

    pub fn assignment_path(&self) -> PathBuf {
        self.path(format!("{}.csv", self.options.basename))
    }

    pub fn alignment_path(&self, index: usize) -> PathBuf {
        self.path(format!(
            "{}_subtree_msa_{:02}.{}",
            self.options.basename, index, self.options.msa_suffix
        ))
    }

    pub fn tree_path(&self, index: usize) -> PathBuf {
        self.path(format!(
            "{}_subtree_{:02}.{}",
            self.options.basename,
            index,
            self.options.tree_format.extension()
        ))
    }

    /// Write every result file and return their paths. Cluster trees are
    /// built, written and dropped one at a time.
    pub fn write(&self, report: &SplitReport) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.options.directory).with_context(|| {
            format!("Failed to create output directory {}", self.options.directory.display())
        })?;

        let mut written = Vec::new();

        let path = self.assignment_path();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let unassigned = write_assignment_table(&mut out, report)?;
        out.flush()?;
        if unassigned > 0 {
            warn!("{} sequences were not assigned to any cluster (-1 in {})", unassigned, path.display());
        }
        written.push(path);

        if self.options.write_alignments {
            for index in 0..report.partition.len() {
                let path = self.alignment_path(index);
                write_fasta(&path, report.cluster_records(index))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                written.push(path);
            }
        }

        if self.options.write_trees {
            for index in 0..report.partition.len() {
                let tree = report
                    .partition
                    .output_tree(index, self.options.clean_empty_clades)?;
                let path = self.tree_path(index);
                write_tree(&path, &tree, self.options.tree_format)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                written.push(path);
            }
        }

        info!("Wrote {} result files to {}", written.len(), self.options.directory.display());
        Ok(written)
    }
}

/// One `<sequence id>, <cluster index>` line per alignment row; -1 marks an
/// unassigned row. Returns the number of unassigned rows.
pub fn write_assignment_table<W: Write>(writer: &mut W, report: &SplitReport) -> Result<usize> {
    let mut unassigned = 0;
    for (id, assignment) in report.assignments() {
        if assignment.cluster().is_none() {
            unassigned += 1;
        }
        writeln!(writer, "{}, {}", id, assignment)?;
    }
    Ok(unassigned)
}

pub fn write_tree(path: &Path, tree: &Tree, format: TreeFormat) -> crate::Result<()> {
    match format {
        TreeFormat::Newick => write_newick(path, tree),
        TreeFormat::PhyloXml => write_phyloxml(path, tree),
    }
}
