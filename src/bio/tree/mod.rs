//! Rooted phylogenetic tree stored as an arena of nodes.
//!
//! Nodes are addressed by [`NodeId`] and keep a parent link, so ancestor
//! lookups are O(depth) without searching from the root. Collapsing a node
//! detaches it from the hierarchy but never reuses its slot: ids handed out
//! before a collapse stay valid, which lets per-node bitsets be sized once
//! from [`Tree::node_capacity`].

pub mod newick;
pub mod phyloxml;
pub mod render;

use crate::KerfError;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 2]>,
    detached: bool,
}

impl Node {
    fn new(name: Option<String>, branch_length: Option<f64>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            branch_length,
            parent,
            children: SmallVec::new(),
            detached: false,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    /// A leaf that carries a name. Unnamed terminals are pruning artifacts
    /// and are traversed like internal nodes.
    pub fn is_named_terminal(&self) -> bool {
        self.is_terminal() && self.name.is_some()
    }
}

/// Incremental construction of a [`Tree`]; used by the Newick reader and tests.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Start a tree with an unnamed root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, None, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_child(&mut self, parent: NodeId, name: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, None, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn set_name(&mut self, node: NodeId, name: Option<String>) {
        self.nodes[node.0].name = name.filter(|n| !n.is_empty());
    }

    pub fn set_branch_length(&mut self, node: NodeId, length: Option<f64>) {
        self.nodes[node.0].branch_length = length;
    }

    /// Finish the tree, rejecting duplicate terminal names.
    pub fn build(self) -> Result<Tree, KerfError> {
        let mut tree = Tree {
            nodes: self.nodes,
            root: NodeId(0),
            terminal_index: HashMap::new(),
        };
        tree.reindex()?;
        Ok(tree)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    terminal_index: HashMap<String, NodeId>,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Upper bound (exclusive) on every `NodeId` this tree has issued.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].name()
    }

    /// Node and all of its live descendants, in left-to-right preorder.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    pub fn preorder(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    /// Every leaf, named or not, in preorder.
    pub fn terminals(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.nodes[id.0].is_terminal())
            .collect()
    }

    /// Named leaves in preorder.
    pub fn named_terminals(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.terminals()
            .into_iter()
            .filter_map(move |id| self.nodes[id.0].name().map(|n| (id, n)))
    }

    pub fn named_terminal_count(&self) -> usize {
        self.terminal_index.len()
    }

    pub fn find_terminal(&self, name: &str) -> Option<NodeId> {
        self.terminal_index.get(name).copied()
    }

    /// Path from the root to `node`: excludes the root, includes `node`.
    /// Empty for the root itself and for detached nodes.
    pub fn path_from_root(&self, node: NodeId) -> Vec<NodeId> {
        if self.nodes[node.0].detached {
            return Vec::new();
        }
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            path.push(current);
            current = parent;
        }
        path.reverse();
        path
    }

    pub fn depth(&self, node: NodeId) -> usize {
        self.path_from_root(node).len()
    }

    /// Remove `node`, splicing its children into its parent at its position.
    pub fn collapse(&mut self, node: NodeId) -> Result<(), KerfError> {
        self.collapse_node(node)?;
        self.reindex()
    }

    /// Collapse several nodes, reindexing terminal names once at the end.
    pub fn collapse_all<I: IntoIterator<Item = NodeId>>(&mut self, nodes: I) -> Result<(), KerfError> {
        for node in nodes {
            self.collapse_node(node)?;
        }
        self.reindex()
    }

    fn collapse_node(&mut self, node: NodeId) -> Result<(), KerfError> {
        if node.0 >= self.nodes.len() || self.nodes[node.0].detached {
            return Err(KerfError::Invariant(format!(
                "cannot collapse node {}: not part of the tree",
                node
            )));
        }
        let parent = self.nodes[node.0].parent.ok_or_else(|| {
            KerfError::Invariant("cannot collapse the root of a tree".to_string())
        })?;

        let children = std::mem::take(&mut self.nodes[node.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(parent);
        }

        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings.iter().position(|&c| c == node).ok_or_else(|| {
            KerfError::Invariant(format!("node {} missing from its parent's children", node))
        })?;
        siblings.remove(position);
        siblings.insert_many(position, children);

        let detached = &mut self.nodes[node.0];
        detached.parent = None;
        detached.detached = true;
        Ok(())
    }

    /// Copy of the live tree without the named terminals `keep` rejects.
    /// Everything else is carried over in one preorder pass, so clades that
    /// lose all their leaves remain as unnamed terminals. The root is always
    /// kept. Node ids are renumbered in the copy.
    pub fn retain_named_terminals<F>(&self, keep: F) -> Result<Tree, KerfError>
    where
        F: Fn(NodeId) -> bool,
    {
        let mut nodes: Vec<Node> = Vec::new();
        // (node in self, parent in the copy)
        let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(self.root, None)];
        while let Some((id, parent)) = stack.pop() {
            let source = &self.nodes[id.0];
            if id != self.root && source.is_named_terminal() && !keep(id) {
                continue;
            }
            let copy = NodeId(nodes.len());
            nodes.push(Node::new(source.name.clone(), source.branch_length, parent));
            if let Some(parent) = parent {
                nodes[parent.0].children.push(copy);
            }
            stack.extend(source.children.iter().rev().map(|&child| (child, Some(copy))));
        }

        let mut tree = Tree {
            nodes,
            root: NodeId(0),
            terminal_index: HashMap::new(),
        };
        tree.reindex()?;
        Ok(tree)
    }

    /// Remove every clade left without a named node, in a single pass.
    /// Returns how many nodes were removed.
    pub fn clean_empty_clades(&mut self) -> Result<usize, KerfError> {
        let order = self.preorder();
        // survives: the root, any named node, any node with a surviving child
        let mut keep = vec![false; self.nodes.len()];
        for &id in order.iter().rev() {
            let node = &self.nodes[id.0];
            keep[id.0] = id == self.root
                || node.name.is_some()
                || node.children.iter().any(|child| keep[child.0]);
        }

        let mut removed = 0;
        for &id in &order {
            let node = &mut self.nodes[id.0];
            if keep[id.0] {
                node.children.retain(|child| keep[child.0]);
            } else {
                node.children.clear();
                node.parent = None;
                node.detached = true;
                removed += 1;
            }
        }

        self.reindex()?;
        Ok(removed)
    }

    fn reindex(&mut self) -> Result<(), KerfError> {
        let mut index = HashMap::new();
        for id in self.terminals() {
            if let Some(name) = self.nodes[id.0].name.as_ref() {
                if index.insert(name.clone(), id).is_some() {
                    return Err(KerfError::Parse(format!(
                        "duplicate terminal name '{}' in tree",
                        name
                    )));
                }
            }
        }
        self.terminal_index = index;
        Ok(())
    }
}
