use crate::bio::tree::Tree;
use crate::core::config::validate_cutoff;
use crate::core::correspondence::Correspondence;
use crate::core::growth::ClusterGrowth;
use crate::core::identity::IdentityMatrix;
use crate::core::node_set::NodeSet;
use crate::core::partition::Partition;
use crate::core::selector::{TraversalPolicy, TraversalSelector};
use crate::KerfError;
use std::sync::Arc;
use tracing::{info, warn};

/// Drives the selector and growth engine until every linked leaf belongs to
/// a cluster.
#[derive(Debug, Clone)]
pub struct Splitter {
    cutoff: f64,
    policy: TraversalPolicy,
}

impl Splitter {
    pub fn new(cutoff: f64) -> Result<Self, KerfError> {
        validate_cutoff(cutoff)?;
        Ok(Self {
            cutoff,
            policy: TraversalPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: TraversalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn policy(&self) -> TraversalPolicy {
        self.policy
    }

    pub fn split(
        &self,
        tree: Arc<Tree>,
        correspondence: &Correspondence,
        matrix: &IdentityMatrix,
    ) -> Result<Partition, KerfError> {
        if correspondence.sequence_count() != matrix.size() {
            return Err(KerfError::Invariant(format!(
                "correspondence covers {} sequences but the identity matrix has {}",
                correspondence.sequence_count(),
                matrix.size()
            )));
        }
        if self.cutoff > 1.0 {
            warn!(
                "Cutoff {} is above any achievable identity; every leaf will be a singleton",
                self.cutoff
            );
        }

        let mut selector = TraversalSelector::from_matrix(matrix, self.policy);
        let growth = ClusterGrowth::new(&tree, correspondence, matrix, self.cutoff);
        let mut processed = NodeSet::new(tree.node_capacity());
        let mut partition = Partition::new(Arc::clone(&tree), self.cutoff);

        while let Some(seed) = selector.next_seed_leaf(&tree, correspondence, &processed) {
            let outcome = growth.grow(seed, &processed)?;
            processed.extend(outcome.members.iter().copied());
            let cluster = partition.push(outcome);
            info!(
                "Cluster {}: {} leaves from seed '{}'",
                cluster.index,
                cluster.len(),
                tree.name(cluster.seed).unwrap_or("?")
            );
        }

        partition.validate(correspondence, matrix)?;
        info!(
            "Split {} leaves into {} clusters at cutoff {} ({} policy)",
            processed.len(),
            partition.len(),
            self.cutoff,
            self.policy
        );
        Ok(partition)
    }
}

/// Split `tree` into clusters whose leaves pairwise meet `cutoff`, drawing
/// seeds by highest weight.
pub fn split_tree(
    tree: impl Into<Arc<Tree>>,
    correspondence: &Correspondence,
    matrix: &IdentityMatrix,
    cutoff: f64,
) -> Result<Partition, KerfError> {
    Splitter::new(cutoff)?.split(tree.into(), correspondence, matrix)
}
