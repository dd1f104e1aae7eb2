use crate::bio::msa::Alignment;
use crate::cli::formatter::{identity_table, print_section, print_stats_table};
use crate::cli::visualize::heat_map;
use crate::core::config::Config;
use crate::core::identity::IdentityMatrix;
use clap::Args;
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// Aligned sequences (FASTA/A2M, optionally gzipped)
    #[arg(value_name = "MSA")]
    pub msa: PathBuf,

    /// Show only traversal weights (summed identity per sequence)
    #[arg(long)]
    pub weights: bool,

    /// Output format (table, csv, heatmap)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Gap symbol in the alignment
    #[arg(long)]
    pub gap_char: Option<char>,

    /// Show a progress bar while scoring identities
    #[arg(long)]
    pub progress: bool,
}

pub fn run(args: IdentityArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(gap) = args.gap_char {
        config.alignment.gap_char = gap;
    }
    config.validate()?;

    let alignment = Alignment::from_path(&args.msa)?;
    let matrix = IdentityMatrix::build_with(
        &alignment,
        config.gap_byte(),
        config.split.parallel_matrix,
        args.progress,
    )?;
    let ids: Vec<String> = alignment.records().iter().map(|r| r.id.clone()).collect();

    if args.weights {
        let mut ranked: Vec<(String, f64)> = ids.into_iter().zip(matrix.weights()).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        match args.format.as_str() {
            "csv" => print!("{}", weights_csv(&ranked)?),
            _ => {
                let rows = ranked
                    .iter()
                    .map(|(id, w)| (id.as_str(), format!("{:.4}", w)))
                    .collect();
                print_stats_table("Traversal weights", rows);
            }
        }
        return Ok(());
    }

    let square = matrix.to_square();
    match args.format.as_str() {
        "csv" => print!("{}", matrix_csv(&ids, &square)?),
        "heatmap" => {
            print_section(&format!("Identity heat map ({} sequences)", ids.len()));
            print!("{}", heat_map(&square, 80, true));
        }
        _ => println!("{}", identity_table(&ids, &square)),
    }
    Ok(())
}

fn matrix_csv(ids: &[String], rows: &[Vec<f64>]) -> anyhow::Result<String> {
    let mut output = String::new();
    writeln!(&mut output, ",{}", ids.join(","))?;
    for (id, row) in ids.iter().zip(rows) {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
        writeln!(&mut output, "{},{}", id, cells.join(","))?;
    }
    Ok(output)
}

fn weights_csv(ranked: &[(String, f64)]) -> anyhow::Result<String> {
    let mut output = String::new();
    writeln!(&mut output, "id,weight")?;
    for (id, weight) in ranked {
        writeln!(&mut output, "{},{:.6}", id, weight)?;
    }
    Ok(output)
}
