pub mod fasta;
pub mod msa;
pub mod sequence;
pub mod tree;

pub use msa::Alignment;
pub use sequence::Sequence;
pub use tree::{NodeId, Tree, TreeBuilder};
