use crate::bio::msa::Alignment;
use crate::bio::tree::newick::read_newick;
use crate::bio::tree::render::render_ascii;
use crate::cli::formatter::{
    format_number, print_section, print_stats_table, print_success, print_tip, print_warning,
};
use crate::cli::visualize::{ascii_histogram, cluster_size_distribution};
use crate::core::config::{Config, TreeFormat};
use crate::core::correspondence::NameRule;
use crate::core::identity::IdentityMatrix;
use crate::core::selector::TraversalPolicy;
use crate::core::{build_correspondence, Splitter};
use crate::report::json::RunSummary;
use crate::report::text::generate_text_report;
use crate::report::{ResultWriter, SplitReport};
use crate::KerfError;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Aligned sequences (FASTA/A2M, optionally gzipped)
    #[arg(value_name = "MSA")]
    pub msa: PathBuf,

    /// Gene family tree in Newick format
    #[arg(value_name = "TREE")]
    pub tree: PathBuf,

    /// Minimum pairwise identity (0.0-1.0) for two sequences to share a cluster.
    /// Falls back to split.cutoff from the config
    #[arg(value_name = "CUTOFF")]
    pub cutoff: Option<f64>,

    /// Seed order: max draws the most broadly similar sequence first, min the least
    #[arg(long)]
    pub policy: Option<TraversalPolicy>,

    /// Prefix for every output file
    #[arg(short, long)]
    pub basename: Option<String>,

    /// Directory for output files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Format of per-cluster tree files (newick, phyloxml)
    #[arg(long)]
    pub tree_format: Option<TreeFormat>,

    /// File extension for per-cluster alignments
    #[arg(long)]
    pub msa_suffix: Option<String>,

    /// Gap symbol in the alignment
    #[arg(long)]
    pub gap_char: Option<char>,

    /// Skip writing per-cluster alignment files
    #[arg(long)]
    pub no_alignments: bool,

    /// Skip writing per-cluster tree files
    #[arg(long)]
    pub no_trees: bool,

    /// Remove clades emptied by pruning from the output trees
    #[arg(long)]
    pub clean: bool,

    /// Draw each cluster tree in the terminal
    #[arg(long)]
    pub draw: bool,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Write a plain-text report of the clusters to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Show a progress bar while scoring identities
    #[arg(long)]
    pub progress: bool,

    /// Score identities on a single thread
    #[arg(long)]
    pub sequential: bool,
}

impl SplitArgs {
    /// Command-line values take precedence over the config file.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(cutoff) = self.cutoff {
            config.split.cutoff = Some(cutoff);
        }
        if let Some(policy) = self.policy {
            config.split.policy = policy;
        }
        if self.sequential {
            config.split.parallel_matrix = false;
        }
        if let Some(gap) = self.gap_char {
            config.alignment.gap_char = gap;
        }
        let output = &mut config.output;
        if let Some(basename) = &self.basename {
            output.basename = basename.clone();
        }
        if let Some(dir) = &self.output_dir {
            output.directory = dir.clone();
        }
        if let Some(format) = self.tree_format {
            output.tree_format = format;
        }
        if let Some(suffix) = &self.msa_suffix {
            output.msa_suffix = suffix.clone();
        }
        if let Some(path) = &self.summary_json {
            output.summary_json = Some(path.clone());
        }
        output.write_alignments &= !self.no_alignments;
        output.write_trees &= !self.no_trees;
        output.clean_empty_clades |= self.clean;
        output.draw |= self.draw;
    }
}

pub fn run(args: SplitArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply_to(&mut config);
    config.validate()?;
    let cutoff = config.split.cutoff.ok_or_else(|| {
        KerfError::Config("no cutoff given: pass CUTOFF or set split.cutoff in the config".to_string())
    })?;

    print_section("Loading inputs");
    let alignment = Alignment::from_path(&args.msa)?;
    let tree = Arc::new(read_newick(&args.tree)?);
    println!(
        "  {} sequences x {} columns, {} named leaves",
        format_number(alignment.len()),
        format_number(alignment.width()),
        format_number(tree.named_terminal_count())
    );

    let rule = NameRule::from(&config.correspondence);
    let correspondence = build_correspondence(&alignment, &tree, &rule)?;
    let matrix = IdentityMatrix::build_with(
        &alignment,
        config.gap_byte(),
        config.split.parallel_matrix,
        args.progress,
    )?;

    let partition = Splitter::new(cutoff)?
        .with_policy(config.split.policy)
        .split(Arc::clone(&tree), &correspondence, &matrix)?;

    let report = SplitReport::new(&alignment, &correspondence, &partition, config.split.policy);
    let mut written = ResultWriter::new(config.output.clone()).write(&report)?;
    let summary = RunSummary::from_report(&report);
    if let Some(path) = &config.output.summary_json {
        summary.write_json(path)?;
        written.push(path.clone());
    }
    if let Some(path) = &args.report {
        std::fs::write(path, generate_text_report(&summary)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        written.push(path.clone());
    }

    print_stats_table(
        "Split Summary",
        vec![
            ("Cutoff", format!("{}", cutoff)),
            ("Policy", config.split.policy.to_string()),
            ("Sequences", format_number(summary.sequences)),
            ("Linked leaves", format_number(summary.linked_terminals)),
            ("Clusters", format_number(summary.clusters.len())),
            ("Largest cluster", format_number(summary.largest_cluster())),
            ("Singletons", format_number(summary.singleton_count())),
            ("Unassigned", format_number(summary.unassigned)),
        ],
    );

    print_section("Cluster sizes");
    print!(
        "{}",
        ascii_histogram(&cluster_size_distribution(&partition.sizes()), 40, true)
    );

    if config.output.draw {
        for cluster in &partition {
            print_section(&format!("Cluster {:02} ({} leaves)", cluster.index, cluster.len()));
            let tree = partition.output_tree(cluster.index, config.output.clean_empty_clades)?;
            print!("{}", render_ascii(&tree));
        }
    }

    if summary.unassigned > 0 {
        print_warning(&format!(
            "{} sequences have no leaf in the tree and were written as -1",
            summary.unassigned
        ));
    }
    if summary.singleton_count() == summary.clusters.len() && summary.clusters.len() > 1 {
        print_tip("every cluster is a singleton; try a lower cutoff");
    }

    print_success(&format!(
        "Wrote {} files to {}",
        written.len(),
        config.output.directory.display()
    ));
    Ok(())
}
