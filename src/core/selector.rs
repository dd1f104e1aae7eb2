//! Seed ordering for cluster growth.
//!
//! Each sequence starts with a weight equal to its summed identity against
//! everyone else. Seeds are drawn by extreme weight; drawing the most broadly
//! similar sequence first tends to form the largest clusters early.

use crate::bio::tree::{NodeId, Tree};
use crate::core::correspondence::Correspondence;
use crate::core::identity::IdentityMatrix;
use crate::core::node_set::NodeSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalPolicy {
    /// Highest weight first
    #[default]
    Max,
    /// Lowest weight first
    Min,
}

impl std::str::FromStr for TraversalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "max" | "maximum" => Ok(TraversalPolicy::Max),
            "min" | "minimum" => Ok(TraversalPolicy::Min),
            _ => Err(format!("Unknown traversal policy: {} (expected max or min)", s)),
        }
    }
}

impl std::fmt::Display for TraversalPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraversalPolicy::Max => f.write_str("max"),
            TraversalPolicy::Min => f.write_str("min"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraversalSelector {
    /// `None` marks an index already handed out.
    weights: Vec<Option<f64>>,
    policy: TraversalPolicy,
}

impl TraversalSelector {
    pub fn new(weights: Vec<f64>, policy: TraversalPolicy) -> Self {
        Self {
            weights: weights.into_iter().map(Some).collect(),
            policy,
        }
    }

    pub fn from_matrix(matrix: &IdentityMatrix, policy: TraversalPolicy) -> Self {
        Self::new(matrix.weights(), policy)
    }

    pub fn policy(&self) -> TraversalPolicy {
        self.policy
    }

    /// Indices not yet handed out.
    pub fn remaining(&self) -> usize {
        self.weights.iter().filter(|w| w.is_some()).count()
    }

    pub fn weight(&self, index: usize) -> Option<f64> {
        self.weights.get(index).copied().flatten()
    }

    /// Take the unconsumed index with the extreme weight. Ties go to the
    /// lowest index.
    pub fn next_index(&mut self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, weight) in self.weights.iter().enumerate() {
            let Some(value) = *weight else { continue };
            let better = match best {
                None => true,
                Some((_, current)) => match self.policy {
                    TraversalPolicy::Max => value > current,
                    TraversalPolicy::Min => value < current,
                },
            };
            if better {
                best = Some((idx, value));
            }
        }

        let (idx, _) = best?;
        self.weights[idx] = None;
        Some(idx)
    }

    /// Draw indices until one maps to a terminal of `tree` that no earlier
    /// cluster has claimed.
    pub fn next_seed_leaf(
        &mut self,
        tree: &Tree,
        correspondence: &Correspondence,
        processed: &NodeSet,
    ) -> Option<NodeId> {
        while let Some(idx) = self.next_index() {
            let Some(name) = correspondence.name_of(idx) else {
                debug!("Sequence {} has no tree terminal, skipping", idx);
                continue;
            };
            let Some(node) = tree.find_terminal(name) else {
                debug!("Terminal '{}' not present in tree, skipping", name);
                continue;
            };
            if processed.contains(node) {
                debug!("Terminal '{}' already clustered, skipping", name);
                continue;
            }
            return Some(node);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::msa::Alignment;
    use crate::bio::sequence::Sequence;
    use crate::bio::tree::newick::parse_newick;
    use crate::core::correspondence::NameRule;

    #[test]
    fn test_max_policy_order_and_exhaustion() {
        let mut selector = TraversalSelector::new(vec![0.5, 2.0, 1.0, 2.0], TraversalPolicy::Max);
        let order: Vec<usize> = std::iter::from_fn(|| selector.next_index()).collect();
        // ties broken by lowest index
        assert_eq!(order, vec![1, 3, 2, 0]);
        assert_eq!(selector.next_index(), None);
        assert_eq!(selector.remaining(), 0);
    }

    #[test]
    fn test_min_policy_order() {
        let mut selector = TraversalSelector::new(vec![0.5, 2.0, 0.5, 1.0], TraversalPolicy::Min);
        let order: Vec<usize> = std::iter::from_fn(|| selector.next_index()).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_zero_weights_are_still_drawn() {
        let mut selector = TraversalSelector::new(vec![0.0, 0.0], TraversalPolicy::Max);
        assert_eq!(selector.next_index(), Some(0));
        assert_eq!(selector.next_index(), Some(1));
        assert_eq!(selector.next_index(), None);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("MAX".parse::<TraversalPolicy>().unwrap(), TraversalPolicy::Max);
        assert_eq!("minimum".parse::<TraversalPolicy>().unwrap(), TraversalPolicy::Min);
        assert!("median".parse::<TraversalPolicy>().is_err());
        assert_eq!(TraversalPolicy::default(), TraversalPolicy::Max);
    }

    #[test]
    fn test_seed_skips_processed_and_unlinked() {
        let records = ["sp|A|x", "sp|B|x", "sp|C|x"]
            .iter()
            .map(|id| Sequence::new(id.to_string(), b"ACGT".to_vec()))
            .collect();
        let aln = Alignment::new(records, "test").unwrap();
        // C has no terminal
        let tree = parse_newick("(A_1,B_1);").unwrap();
        let map = Correspondence::build(&aln, &tree, &NameRule::default()).unwrap();

        let a = tree.find_terminal("A_1").unwrap();
        let b = tree.find_terminal("B_1").unwrap();
        let mut processed = NodeSet::new(tree.node_capacity());
        processed.insert(a);

        // weights put C first, then A, then B
        let mut selector = TraversalSelector::new(vec![2.0, 1.0, 3.0], TraversalPolicy::Max);
        assert_eq!(selector.next_seed_leaf(&tree, &map, &processed), Some(b));
        assert_eq!(selector.next_seed_leaf(&tree, &map, &processed), None);
    }
}
