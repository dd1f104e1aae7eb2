pub mod bio;
pub mod cli;
pub mod core;
pub mod report;
pub mod utils;

pub use crate::core::{
    build_correspondence, build_identity_matrix, split_tree, Correspondence, IdentityMatrix,
    Partition, SequenceRef, Splitter, TraversalPolicy,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KerfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No sequences found in alignment '{0}'")]
    EmptyAlignment(String),

    #[error("Mismatched alignment length for '{id}': expected {expected}, found {found}")]
    MismatchedLength {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("Degenerate alignment pair '{lhs}' and '{rhs}': every column is gapped in both")]
    DegeneratePair { lhs: String, rhs: String },

    #[error("Unmatched terminal '{0}': no sequence identifier corresponds to it")]
    UnmatchedTerminal(String),

    #[error("Ambiguous terminal '{name}': sequence {index} is already claimed by '{other}'")]
    AmbiguousTerminal {
        name: String,
        index: usize,
        other: String,
    },

    #[error("Unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("Index {index} out of range for {size} sequences")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Identity requested between sequence {0} and itself")]
    SelfIdentity(usize),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl KerfError {
    /// Process exit code used by the binary for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            KerfError::Config(_) => 2,
            KerfError::Io(_) => 3,
            KerfError::Parse(_)
            | KerfError::EmptyAlignment(_)
            | KerfError::MismatchedLength { .. }
            | KerfError::DegeneratePair { .. } => 4,
            KerfError::UnmatchedTerminal(_)
            | KerfError::AmbiguousTerminal { .. }
            | KerfError::UnknownIdentifier(_) => 5,
            KerfError::IndexOutOfRange { .. }
            | KerfError::SelfIdentity(_)
            | KerfError::Invariant(_) => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, KerfError>;
