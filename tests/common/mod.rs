/// Shared fixtures for kerf integration tests
use kerf::bio::msa::Alignment;
use kerf::bio::sequence::Sequence;
use kerf::bio::tree::newick::parse_newick;
use kerf::bio::tree::Tree;
use kerf::core::correspondence::{Correspondence, NameRule};
use kerf::core::identity::{IdentityMatrix, DEFAULT_GAP};
use kerf::core::partition::Partition;
use std::path::{Path, PathBuf};

/// Alignment, tree and derived structures for one gene family
pub struct Family {
    pub alignment: Alignment,
    pub tree: Tree,
    pub correspondence: Correspondence,
    pub matrix: IdentityMatrix,
}

pub fn alignment(rows: &[(&str, &str)]) -> Alignment {
    let records = rows
        .iter()
        .map(|(id, s)| Sequence::new(id.to_string(), s.as_bytes().to_vec()))
        .collect();
    Alignment::new(records, "fixture").expect("fixture alignment")
}

pub fn family(newick: &str, rows: &[(&str, &str)]) -> Family {
    let alignment = alignment(rows);
    let tree = parse_newick(newick).expect("fixture tree");
    let correspondence =
        Correspondence::build(&alignment, &tree, &NameRule::default()).expect("fixture mapping");
    let matrix = IdentityMatrix::build(&alignment, DEFAULT_GAP).expect("fixture matrix");
    Family {
        alignment,
        tree,
        correspondence,
        matrix,
    }
}

/// S1=ACGT, S2=ACGA, S3=TTTT under ((S1,S2),S3)
pub fn reference_family() -> Family {
    family(
        "((S1_a,S2_a),S3_a);",
        &[("grp|S1", "ACGT"), ("grp|S2", "ACGA"), ("grp|S3", "TTTT")],
    )
}

#[allow(dead_code)]
pub fn reference_fasta() -> &'static str {
    ">grp|S1 first\nACGT\n>grp|S2\nACGA\n>grp|S3\nTTTT\n>grp|S4 not in tree\nACGT\n"
}

/// Write an alignment and a tree into `dir`, returning their paths
#[allow(dead_code)]
pub fn write_inputs(dir: &Path, fasta: &str, newick: &str) -> (PathBuf, PathBuf) {
    let msa = dir.join("family.a2m");
    let tree = dir.join("family.nwk");
    std::fs::write(&msa, fasta).expect("write msa");
    std::fs::write(&tree, newick).expect("write tree");
    (msa, tree)
}

/// Leaf names of every cluster, in acceptance order
#[allow(dead_code)]
pub fn cluster_names(partition: &Partition) -> Vec<Vec<String>> {
    partition
        .iter()
        .map(|c| {
            c.leaf_names(partition.tree())
                .into_iter()
                .map(String::from)
                .collect()
        })
        .collect()
}
