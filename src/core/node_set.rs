use crate::bio::tree::NodeId;
use bit_vec::BitVec;

/// Set of tree nodes backed by a bitset sized to the tree's node capacity.
#[derive(Debug, Clone)]
pub struct NodeSet {
    bits: BitVec,
    count: usize,
}

impl NodeSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: BitVec::from_elem(capacity, false),
            count: 0,
        }
    }

    /// Returns true if the node was not already present.
    pub fn insert(&mut self, node: NodeId) -> bool {
        if self.contains(node) {
            return false;
        }
        self.bits.set(node.index(), true);
        self.count += 1;
        true
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.bits.get(node.index()).unwrap_or(false)
    }

    pub fn extend<I: IntoIterator<Item = NodeId>>(&mut self, nodes: I) {
        for node in nodes {
            self.insert(node);
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
