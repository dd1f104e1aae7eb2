//! Clusters produced by a split, and what can be derived from them.

use crate::bio::tree::{NodeId, Tree};
use crate::core::correspondence::{Correspondence, SequenceRef};
use crate::core::growth::GrowthOutcome;
use crate::core::identity::IdentityMatrix;
use crate::core::node_set::NodeSet;
use crate::KerfError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// One cluster: the seed it grew from and the leaves it retains. The pruned
/// tree is not stored; see [`Partition::output_tree`].
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    pub index: usize,
    pub seed: NodeId,
    /// Retained leaves in acceptance order.
    pub leaves: Vec<NodeId>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn contains(&self, leaf: NodeId) -> bool {
        self.leaves.contains(&leaf)
    }

    /// Leaf names in acceptance order.
    pub fn leaf_names<'t>(&self, tree: &'t Tree) -> Vec<&'t str> {
        self.leaves.iter().filter_map(|&leaf| tree.name(leaf)).collect()
    }
}

/// Where an input sequence ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Cluster(usize),
    /// The sequence has no terminal in the tree.
    NoTerminal,
    /// The sequence has a terminal but no cluster retains it.
    Missing,
}

impl Assignment {
    pub fn cluster(&self) -> Option<usize> {
        match self {
            Assignment::Cluster(index) => Some(*index),
            _ => None,
        }
    }

    /// Cluster index, or -1 when unassigned.
    pub fn as_index(&self) -> i64 {
        self.cluster().map(|i| i as i64).unwrap_or(-1)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_index())
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    tree: Arc<Tree>,
    cutoff: f64,
    clusters: Vec<Cluster>,
    /// Preorder position of every node, indexed by `NodeId`.
    preorder_rank: Vec<usize>,
}

impl Partition {
    pub fn new(tree: Arc<Tree>, cutoff: f64) -> Self {
        let mut preorder_rank = vec![usize::MAX; tree.node_capacity()];
        for (rank, id) in tree.preorder().into_iter().enumerate() {
            preorder_rank[id.index()] = rank;
        }
        Self {
            tree,
            cutoff,
            clusters: Vec::new(),
            preorder_rank,
        }
    }

    /// Record a finished growth pass as the next cluster.
    pub fn push(&mut self, outcome: GrowthOutcome) -> &Cluster {
        let index = self.clusters.len();
        self.clusters.push(Cluster {
            index,
            seed: outcome.seed,
            leaves: outcome.members,
        });
        &self.clusters[index]
    }

    /// The unpruned input tree every cluster refers to.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn get(&self, index: usize) -> Option<&Cluster> {
        self.clusters.get(index)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    /// Cluster sizes in production order.
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(Cluster::len).collect()
    }

    /// Leaves of cluster `index` in tree order rather than acceptance order.
    pub fn leaves_in_tree_order(&self, index: usize) -> Vec<NodeId> {
        let Some(cluster) = self.clusters.get(index) else {
            return Vec::new();
        };
        let mut leaves = cluster.leaves.clone();
        leaves.sort_by_key(|leaf| self.preorder_rank[leaf.index()]);
        leaves
    }

    /// Index of the cluster retaining `leaf_name`, searching every cluster.
    pub fn cluster_of(&self, leaf_name: &str) -> Option<usize> {
        let leaf = self.tree.find_terminal(leaf_name)?;
        self.clusters
            .iter()
            .find(|cluster| cluster.contains(leaf))
            .map(|cluster| cluster.index)
    }

    /// The input tree with every named terminal outside the cluster
    /// removed, built in one pass over the shared tree. With `clean`, clades
    /// emptied by the pruning are removed too.
    pub fn output_tree(&self, index: usize, clean: bool) -> Result<Tree, KerfError> {
        let cluster = self.clusters.get(index).ok_or(KerfError::IndexOutOfRange {
            index,
            size: self.clusters.len(),
        })?;

        let mut retained = NodeSet::new(self.tree.node_capacity());
        retained.extend(cluster.leaves.iter().copied());
        let mut tree = self
            .tree
            .retain_named_terminals(|leaf| retained.contains(leaf))?;
        if clean {
            tree.clean_empty_clades()?;
        }
        Ok(tree)
    }

    /// Where each alignment row ended up, indexed by row.
    pub fn assignments(&self, correspondence: &Correspondence) -> Vec<Assignment> {
        let mut owner: HashMap<NodeId, usize> = HashMap::new();
        for cluster in &self.clusters {
            for &leaf in &cluster.leaves {
                owner.insert(leaf, cluster.index);
            }
        }

        (0..correspondence.sequence_count())
            .map(|index| {
                let Some(name) = correspondence.name_of(index) else {
                    return Assignment::NoTerminal;
                };
                match self.tree.find_terminal(name).and_then(|leaf| owner.get(&leaf)) {
                    Some(&cluster) => Assignment::Cluster(cluster),
                    None => {
                        warn!("Leaf '{}' is linked to sequence {} but retained by no cluster", name, index);
                        Assignment::Missing
                    }
                }
            })
            .collect()
    }

    /// Check that clusters are leaf-disjoint, together cover every linked
    /// terminal, and each is a clique under the cutoff.
    pub fn validate(
        &self,
        correspondence: &Correspondence,
        matrix: &IdentityMatrix,
    ) -> Result<(), KerfError> {
        let mut seen = NodeSet::new(self.tree.node_capacity());
        let mut owner: HashMap<NodeId, usize> = HashMap::new();

        for cluster in &self.clusters {
            let mut indices = Vec::with_capacity(cluster.leaves.len());
            for &leaf in &cluster.leaves {
                if !seen.insert(leaf) {
                    return Err(KerfError::Invariant(format!(
                        "leaf '{}' retained by clusters {} and {}",
                        self.tree.name(leaf).unwrap_or("?"),
                        owner.get(&leaf).copied().unwrap_or_default(),
                        cluster.index
                    )));
                }
                owner.insert(leaf, cluster.index);

                let name = self.tree.name(leaf).ok_or_else(|| {
                    KerfError::Invariant(format!("cluster {} retains unnamed node {}", cluster.index, leaf))
                })?;
                indices.push(correspondence.resolve(&SequenceRef::ByName(name.to_string()))?);
            }

            for (a, &i) in indices.iter().enumerate() {
                for &j in &indices[a + 1..] {
                    let identity = matrix.pairwise(i, j)?;
                    if identity < self.cutoff {
                        return Err(KerfError::Invariant(format!(
                            "cluster {} pairs sequences {} and {} at identity {:.4}, below cutoff {}",
                            cluster.index, i, j, identity, self.cutoff
                        )));
                    }
                }
            }
        }

        for (name, _) in correspondence.iter() {
            let covered = self
                .tree
                .find_terminal(name)
                .map(|leaf| seen.contains(leaf))
                .unwrap_or(false);
            if !covered {
                return Err(KerfError::Invariant(format!(
                    "leaf '{}' is not retained by any cluster",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Partition {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::msa::Alignment;
    use crate::bio::sequence::Sequence;
    use crate::bio::tree::newick::{parse_newick, to_newick};
    use crate::core::correspondence::NameRule;
    use crate::core::identity::DEFAULT_GAP;

    struct Fixture {
        tree: Arc<Tree>,
        map: Correspondence,
        matrix: IdentityMatrix,
    }

    fn reference() -> Fixture {
        let records = [("g|S1", "ACGT"), ("g|S2", "ACGA"), ("g|S3", "TTTT"), ("g|S4", "ACGT")]
            .iter()
            .map(|(id, s)| Sequence::new(id.to_string(), s.as_bytes().to_vec()))
            .collect();
        let aln = Alignment::new(records, "test").unwrap();
        // S4 has no terminal
        let tree = parse_newick("((S1_a,S2_a),S3_a);").unwrap();
        let map = Correspondence::build(&aln, &tree, &NameRule::default()).unwrap();
        let matrix = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        Fixture {
            tree: Arc::new(tree),
            map,
            matrix,
        }
    }

    fn leaf(f: &Fixture, name: &str) -> NodeId {
        f.tree.find_terminal(name).unwrap()
    }

    fn outcome(seed: NodeId, members: Vec<NodeId>) -> GrowthOutcome {
        GrowthOutcome {
            seed,
            members,
            rejected: Vec::new(),
            claimed: Vec::new(),
            visited: 0,
        }
    }

    fn two_clusters(f: &Fixture) -> Partition {
        let (s1, s2, s3) = (leaf(f, "S1_a"), leaf(f, "S2_a"), leaf(f, "S3_a"));
        let mut partition = Partition::new(f.tree.clone(), 0.5);
        partition.push(outcome(s1, vec![s1, s2]));
        partition.push(outcome(s3, vec![s3]));
        partition
    }

    #[test]
    fn test_assignments_and_lookup() {
        let f = reference();
        let partition = two_clusters(&f);

        assert_eq!(partition.sizes(), vec![2, 1]);
        assert_eq!(partition.cluster_of("S2_a"), Some(0));
        assert_eq!(partition.cluster_of("S3_a"), Some(1));
        assert_eq!(partition.cluster_of("nope"), None);

        let assignments = partition.assignments(&f.map);
        assert_eq!(
            assignments,
            vec![
                Assignment::Cluster(0),
                Assignment::Cluster(0),
                Assignment::Cluster(1),
                Assignment::NoTerminal,
            ]
        );
        assert_eq!(assignments[3].as_index(), -1);
    }

    #[test]
    fn test_output_tree_keeps_only_members() {
        let f = reference();
        let partition = two_clusters(&f);

        assert_eq!(
            partition.leaves_in_tree_order(0),
            vec![leaf(&f, "S1_a"), leaf(&f, "S2_a")]
        );
        assert!(partition.leaves_in_tree_order(9).is_empty());

        let first = partition.output_tree(0, false).unwrap();
        assert_eq!(to_newick(&first), "((S1_a,S2_a));");

        // the emptied clade is left as an unnamed terminal unless cleaned
        let second = partition.output_tree(1, false).unwrap();
        assert_eq!(to_newick(&second), "(,S3_a);");
        let cleaned = partition.output_tree(1, true).unwrap();
        assert_eq!(to_newick(&cleaned), "(S3_a);");

        // the shared tree is untouched
        assert_eq!(partition.tree().named_terminal_count(), 3);
        assert!(partition.output_tree(2, false).is_err());
    }

    #[test]
    fn test_singleton_trees_of_a_star_stay_small() {
        let leaves = 500;
        let mut builder = crate::bio::tree::TreeBuilder::new();
        let root = builder.root();
        let ids: Vec<NodeId> = (0..leaves)
            .map(|i| builder.add_child(root, Some(format!("L{}_x", i))))
            .collect();
        let mut partition = Partition::new(Arc::new(builder.build().unwrap()), 1.5);
        for &leaf in &ids {
            partition.push(outcome(leaf, vec![leaf]));
        }

        for index in [0, 250, leaves - 1] {
            let tree = partition.output_tree(index, false).unwrap();
            // root plus the one retained leaf, nothing else copied
            assert_eq!(tree.node_capacity(), 2);
            assert_eq!(to_newick(&tree), format!("(L{}_x);", index));
        }
        assert_eq!(partition.tree().node_capacity(), leaves + 1);
    }

    #[test]
    fn test_validate_accepts_sound_partition() {
        let f = reference();
        two_clusters(&f).validate(&f.map, &f.matrix).unwrap();
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let f = reference();
        let (s1, s2, s3) = (leaf(&f, "S1_a"), leaf(&f, "S2_a"), leaf(&f, "S3_a"));
        let mut partition = Partition::new(f.tree.clone(), 0.0);
        partition.push(outcome(s1, vec![s1, s2]));
        partition.push(outcome(s3, vec![s3, s2]));
        let err = partition.validate(&f.map, &f.matrix).unwrap_err();
        assert!(err.to_string().contains("S2_a"));
    }

    #[test]
    fn test_validate_rejects_gap_in_coverage() {
        let f = reference();
        let (s1, s2) = (leaf(&f, "S1_a"), leaf(&f, "S2_a"));
        let mut partition = Partition::new(f.tree.clone(), 0.5);
        partition.push(outcome(s1, vec![s1, s2]));
        let err = partition.validate(&f.map, &f.matrix).unwrap_err();
        assert!(err.to_string().contains("S3_a"));
    }

    #[test]
    fn test_validate_rejects_clique_violation() {
        let f = reference();
        let (s1, s2, s3) = (leaf(&f, "S1_a"), leaf(&f, "S2_a"), leaf(&f, "S3_a"));
        let mut partition = Partition::new(f.tree.clone(), 0.5);
        partition.push(outcome(s1, vec![s1, s3]));
        partition.push(outcome(s2, vec![s2]));
        assert!(matches!(
            partition.validate(&f.map, &f.matrix),
            Err(KerfError::Invariant(_))
        ));
    }
}
