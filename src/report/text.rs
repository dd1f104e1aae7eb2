use crate::report::json::RunSummary;
use anyhow::Result;
use std::fmt::Write;

/// Cluster listings beyond this many leaves are truncated.
const MAX_LISTED_LEAVES: usize = 10;

pub fn generate_text_report(summary: &RunSummary) -> Result<String> {
    let mut output = String::new();

    writeln!(&mut output, "Kerf Split Report")?;
    writeln!(&mut output, "=================")?;
    writeln!(&mut output)?;

    writeln!(&mut output, "Cutoff: {} ({} policy)", summary.cutoff, summary.policy)?;
    writeln!(&mut output, "Generated: {}", summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(&mut output)?;

    writeln!(&mut output, "Summary")?;
    writeln!(&mut output, "-------")?;
    writeln!(&mut output, "- Sequences:        {:6}", summary.sequences)?;
    writeln!(&mut output, "- Linked terminals: {:6}", summary.linked_terminals)?;
    writeln!(&mut output, "- Unassigned:       {:6}", summary.unassigned)?;
    writeln!(&mut output, "- Clusters:         {:6}", summary.clusters.len())?;
    writeln!(&mut output, "- Largest cluster:  {:6}", summary.largest_cluster())?;
    writeln!(&mut output, "- Singletons:       {:6}", summary.singleton_count())?;
    writeln!(&mut output)?;

    writeln!(&mut output, "Clusters")?;
    writeln!(&mut output, "--------")?;
    for cluster in &summary.clusters {
        writeln!(
            &mut output,
            "  {:02}: {} leaves (seed {})",
            cluster.index, cluster.size, cluster.seed
        )?;
        for leaf in cluster.leaves.iter().take(MAX_LISTED_LEAVES) {
            writeln!(&mut output, "    {}", leaf)?;
        }
        if cluster.leaves.len() > MAX_LISTED_LEAVES {
            writeln!(&mut output, "    ... and {} more", cluster.leaves.len() - MAX_LISTED_LEAVES)?;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::json::ClusterSummary;
    use chrono::Utc;

    #[test]
    fn test_report_lists_clusters_and_truncates() {
        let leaves: Vec<String> = (0..12).map(|i| format!("L{}_x", i)).collect();
        let summary = RunSummary {
            generated_at: Utc::now(),
            cutoff: 0.8,
            policy: "max".to_string(),
            sequences: 13,
            linked_terminals: 13,
            unassigned: 0,
            clusters: vec![
                ClusterSummary {
                    index: 0,
                    size: 12,
                    seed: "L0_x".to_string(),
                    leaves,
                },
                ClusterSummary {
                    index: 1,
                    size: 1,
                    seed: "Q_x".to_string(),
                    leaves: vec!["Q_x".to_string()],
                },
            ],
        };

        let text = generate_text_report(&summary).unwrap();
        assert!(text.contains("Cutoff: 0.8 (max policy)"));
        assert!(text.contains("  00: 12 leaves (seed L0_x)"));
        assert!(text.contains("    L9_x"));
        assert!(!text.contains("    L10_x"));
        assert!(text.contains("... and 2 more"));
        let singletons = text.lines().find(|l| l.starts_with("- Singletons:")).unwrap();
        assert_eq!(singletons.split_whitespace().last(), Some("1"));
    }
}
