//! Growing one cluster from a seed leaf.
//!
//! The pass climbs from the seed to the root. At each ancestor it scans the
//! ancestor's whole subtree (minus parts already scanned) and tests every
//! leaf it meets against everything accepted so far. A leaf joins only if its
//! identity to *every* current member meets the cutoff, so a cluster is a
//! clique under the cutoff. Leaves are tested in tree order and the member set
//! grows mid-scan, so the result depends on traversal order.
//!
//! Both the climb and the scan are explicit loops; stack usage does not
//! depend on tree depth.

use crate::bio::tree::{NodeId, Tree};
use crate::core::correspondence::{Correspondence, SequenceRef};
use crate::core::identity::IdentityMatrix;
use crate::core::node_set::NodeSet;
use crate::KerfError;
use tracing::debug;

/// Result of one growth pass.
#[derive(Debug, Clone)]
pub struct GrowthOutcome {
    pub seed: NodeId,
    /// Accepted leaves, in acceptance order (the seed first).
    pub members: Vec<NodeId>,
    /// Leaves tested and turned away in this pass.
    pub rejected: Vec<NodeId>,
    /// Leaves skipped because an earlier cluster already owns them.
    pub claimed: Vec<NodeId>,
    /// Nodes examined, internal ones included.
    pub visited: usize,
}

struct PassState {
    members: Vec<NodeId>,
    member_indices: Vec<usize>,
    in_cluster: NodeSet,
    rejected: Vec<NodeId>,
    claimed: Vec<NodeId>,
    visited: NodeSet,
}

pub struct ClusterGrowth<'a> {
    tree: &'a Tree,
    correspondence: &'a Correspondence,
    matrix: &'a IdentityMatrix,
    cutoff: f64,
}

impl<'a> ClusterGrowth<'a> {
    pub fn new(
        tree: &'a Tree,
        correspondence: &'a Correspondence,
        matrix: &'a IdentityMatrix,
        cutoff: f64,
    ) -> Self {
        Self {
            tree,
            correspondence,
            matrix,
            cutoff,
        }
    }

    fn sequence_index(&self, leaf: NodeId) -> Result<usize, KerfError> {
        let name = self.tree.name(leaf).ok_or_else(|| {
            KerfError::Invariant(format!("leaf {} has no name to resolve", leaf))
        })?;
        self.correspondence.resolve(&SequenceRef::ByName(name.to_string()))
    }

    fn fits_clique(&self, candidate: usize, members: &[usize]) -> Result<bool, KerfError> {
        for &member in members {
            if self.matrix.pairwise(candidate, member)? < self.cutoff {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when `candidate` meets the cutoff against every leaf in `added`.
    /// An empty `added` accepts anything.
    pub fn can_add(&self, candidate: NodeId, added: &[NodeId]) -> Result<bool, KerfError> {
        let candidate = self.sequence_index(candidate)?;
        let members = added
            .iter()
            .map(|&leaf| self.sequence_index(leaf))
            .collect::<Result<Vec<_>, _>>()?;
        self.fits_clique(candidate, &members)
    }

    /// Run one pass from `seed`. Leaves in `processed` belong to earlier
    /// clusters and are never tested.
    pub fn grow(&self, seed: NodeId, processed: &NodeSet) -> Result<GrowthOutcome, KerfError> {
        let capacity = self.tree.node_capacity();
        let mut state = PassState {
            members: Vec::new(),
            member_indices: Vec::new(),
            in_cluster: NodeSet::new(capacity),
            rejected: Vec::new(),
            claimed: Vec::new(),
            visited: NodeSet::new(capacity),
        };

        let mut current = Some(seed);
        while let Some(node) = current {
            if state.visited.contains(node) {
                break;
            }
            self.scan_subtree(node, &mut state, processed)?;
            current = self.tree.parent(node);
        }

        debug!(
            "Pass from '{}' kept {} leaves, rejected {}, skipped {} claimed",
            self.tree.name(seed).unwrap_or("?"),
            state.members.len(),
            state.rejected.len(),
            state.claimed.len()
        );

        Ok(GrowthOutcome {
            seed,
            members: state.members,
            rejected: state.rejected,
            claimed: state.claimed,
            visited: state.visited.len(),
        })
    }

    /// Preorder walk of `start` and its descendants, stopping at nodes
    /// already visited in this pass.
    fn scan_subtree(
        &self,
        start: NodeId,
        state: &mut PassState,
        processed: &NodeSet,
    ) -> Result<(), KerfError> {
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !state.visited.insert(node) {
                continue;
            }
            let entry = self.tree.node(node);
            if entry.is_named_terminal() {
                self.consider(node, state, processed)?;
            } else {
                // Internal node or unnamed terminal: only its children matter.
                stack.extend(entry.children().iter().rev().copied());
            }
        }
        Ok(())
    }

    fn consider(
        &self,
        leaf: NodeId,
        state: &mut PassState,
        processed: &NodeSet,
    ) -> Result<(), KerfError> {
        if processed.contains(leaf) {
            state.claimed.push(leaf);
            return Ok(());
        }
        if state.in_cluster.contains(leaf) {
            return Ok(());
        }

        let index = self.sequence_index(leaf)?;
        if self.fits_clique(index, &state.member_indices)? {
            debug!("Accepted '{}'", self.tree.name(leaf).unwrap_or("?"));
            state.members.push(leaf);
            state.member_indices.push(index);
            state.in_cluster.insert(leaf);
        } else {
            debug!("Rejected '{}'", self.tree.name(leaf).unwrap_or("?"));
            state.rejected.push(leaf);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::msa::Alignment;
    use crate::bio::sequence::Sequence;
    use crate::bio::tree::newick::parse_newick;
    use crate::core::correspondence::NameRule;
    use crate::core::identity::DEFAULT_GAP;

    struct Fixture {
        tree: Tree,
        map: Correspondence,
        matrix: IdentityMatrix,
    }

    fn fixture(newick: &str, rows: &[(&str, &str)]) -> Fixture {
        let records = rows
            .iter()
            .map(|(id, s)| Sequence::new(id.to_string(), s.as_bytes().to_vec()))
            .collect();
        let aln = Alignment::new(records, "test").unwrap();
        let tree = parse_newick(newick).unwrap();
        let map = Correspondence::build(&aln, &tree, &NameRule::default()).unwrap();
        let matrix = IdentityMatrix::build(&aln, DEFAULT_GAP).unwrap();
        Fixture { tree, map, matrix }
    }

    fn names<'t>(tree: &'t Tree, nodes: &[NodeId]) -> Vec<&'t str> {
        nodes.iter().filter_map(|&n| tree.name(n)).collect()
    }

    fn reference() -> Fixture {
        fixture(
            "((S1_a,S2_a),S3_a);",
            &[("g|S1", "ACGT"), ("g|S2", "ACGA"), ("g|S3", "TTTT")],
        )
    }

    #[test]
    fn test_empty_clique_accepts() {
        let f = reference();
        let growth = ClusterGrowth::new(&f.tree, &f.map, &f.matrix, 0.99);
        let s3 = f.tree.find_terminal("S3_a").unwrap();
        assert!(growth.can_add(s3, &[]).unwrap());
    }

    #[test]
    fn test_can_add_requires_every_pair() {
        let f = reference();
        let growth = ClusterGrowth::new(&f.tree, &f.map, &f.matrix, 0.2);
        let s1 = f.tree.find_terminal("S1_a").unwrap();
        let s2 = f.tree.find_terminal("S2_a").unwrap();
        let s3 = f.tree.find_terminal("S3_a").unwrap();
        // S3 passes against S1 (0.25) but not against S2 (0.0)
        assert!(growth.can_add(s3, &[s1]).unwrap());
        assert!(!growth.can_add(s3, &[s1, s2]).unwrap());
    }

    #[test]
    fn test_pass_climbs_and_prunes() {
        let f = reference();
        let growth = ClusterGrowth::new(&f.tree, &f.map, &f.matrix, 0.5);
        let seed = f.tree.find_terminal("S1_a").unwrap();
        let processed = NodeSet::new(f.tree.node_capacity());

        let outcome = growth.grow(seed, &processed).unwrap();
        assert_eq!(names(&f.tree, &outcome.members), vec!["S1_a", "S2_a"]);
        assert_eq!(names(&f.tree, &outcome.rejected), vec!["S3_a"]);
        // every node of the tree is examined once
        assert_eq!(outcome.visited, f.tree.preorder().len());
    }

    #[test]
    fn test_claimed_leaves_are_not_retested() {
        let f = reference();
        let growth = ClusterGrowth::new(&f.tree, &f.map, &f.matrix, 0.0);
        let s1 = f.tree.find_terminal("S1_a").unwrap();
        let s3 = f.tree.find_terminal("S3_a").unwrap();
        let mut processed = NodeSet::new(f.tree.node_capacity());
        processed.insert(s1);

        let outcome = growth.grow(s3, &processed).unwrap();
        assert_eq!(names(&f.tree, &outcome.members), vec!["S3_a", "S2_a"]);
        assert_eq!(names(&f.tree, &outcome.claimed), vec!["S1_a"]);
    }

    #[test]
    fn test_members_reach_beyond_seed_lineage() {
        // D sits in a different clade from the seed A but qualifies at the root
        let f = fixture(
            "((A_x,B_x),(C_x,D_x));",
            &[
                ("g|A", "AAAAAAAAAA"),
                ("g|B", "CCCCCCCCCC"),
                ("g|C", "GGGGGGGGGG"),
                ("g|D", "AAAAAAAAAC"),
            ],
        );
        let growth = ClusterGrowth::new(&f.tree, &f.map, &f.matrix, 0.8);
        let seed = f.tree.find_terminal("A_x").unwrap();
        let outcome = growth
            .grow(seed, &NodeSet::new(f.tree.node_capacity()))
            .unwrap();
        assert_eq!(names(&f.tree, &outcome.members), vec!["A_x", "D_x"]);
        assert_eq!(names(&f.tree, &outcome.rejected), vec!["B_x", "C_x"]);
    }

    #[test]
    fn test_unnamed_terminal_is_never_tested() {
        let f = fixture(
            "((S1_a,),S2_a);",
            &[("g|S1", "ACGT"), ("g|S2", "ACGA")],
        );
        let growth = ClusterGrowth::new(&f.tree, &f.map, &f.matrix, 0.0);
        let seed = f.tree.find_terminal("S1_a").unwrap();
        let outcome = growth
            .grow(seed, &NodeSet::new(f.tree.node_capacity()))
            .unwrap();
        assert_eq!(names(&f.tree, &outcome.members), vec!["S1_a", "S2_a"]);
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.visited, 5);
    }
}
