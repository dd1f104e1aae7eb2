pub mod config;
pub mod correspondence;
pub mod growth;
pub mod identity;
pub mod node_set;
pub mod partition;
pub mod selector;
pub mod splitter;

pub use config::Config;
pub use correspondence::{Correspondence, NameRule, SequenceRef};
pub use growth::{ClusterGrowth, GrowthOutcome};
pub use identity::{percent_identity, IdentityMatrix};
pub use node_set::NodeSet;
pub use partition::{Assignment, Cluster, Partition};
pub use selector::{TraversalPolicy, TraversalSelector};
pub use splitter::{split_tree, Splitter};

use crate::bio::msa::Alignment;
use crate::bio::tree::Tree;
use crate::KerfError;

/// Pairwise identity of every alignment row, built on the rayon pool.
pub fn build_identity_matrix(alignment: &Alignment, gap: u8) -> Result<IdentityMatrix, KerfError> {
    IdentityMatrix::build(alignment, gap)
}

/// Link the named terminals of `tree` to alignment rows under `rule`.
pub fn build_correspondence(
    alignment: &Alignment,
    tree: &Tree,
    rule: &NameRule,
) -> Result<Correspondence, KerfError> {
    Correspondence::build(alignment, tree, rule)
}
