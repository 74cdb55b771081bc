use super::arena::Arena;
use super::handle::Handle;
use super::node::{BranchNode, LeafNode, Node};

/// Owns the node arena, the root reference, and the configured order.
///
/// Every structural routine works through handles into this store; the store is
/// the single place that knows how nodes are allocated and reclaimed.
pub(crate) struct NodeStore<K, V> {
    nodes: Arena<Node<K, V>>,
    root: Handle,
    order: usize,
}

impl<K: Ord + Clone, V> NodeStore<K, V> {
    /// Creates a store whose root is a fresh empty leaf.
    pub(crate) fn new(order: usize) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::Leaf(LeafNode::new(order)));
        Self { nodes, root, order }
    }

    #[inline]
    pub(crate) fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub(crate) fn root(&self) -> Handle {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: Handle) {
        self.root = root;
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(crate) fn leaf(&self, handle: Handle) -> &LeafNode<K, V> {
        self.nodes.get(handle).as_leaf()
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, handle: Handle) -> &mut LeafNode<K, V> {
        self.nodes.get_mut(handle).as_leaf_mut()
    }

    #[inline]
    pub(crate) fn branch(&self, handle: Handle) -> &BranchNode<K> {
        self.nodes.get(handle).as_branch()
    }

    #[inline]
    pub(crate) fn branch_mut(&mut self, handle: Handle) -> &mut BranchNode<K> {
        self.nodes.get_mut(handle).as_branch_mut()
    }

    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> Handle {
        self.nodes.alloc(node)
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        self.nodes.free(handle);
    }

    /// The minimum key of the subtree rooted at `handle`.
    #[inline]
    pub(crate) fn min_key(&self, handle: Handle) -> &K {
        self.node(handle).min_key()
    }

    /// Repairs `keys[index]` of a branch to its child's current minimum.
    pub(crate) fn reset_key(&mut self, branch: Handle, index: usize) {
        let child = self.branch(branch).child(index);
        let key = self.min_key(child).clone();
        self.branch_mut(branch).set_key(index, key);
    }

    /// Drops every node and reinstates a fresh empty leaf as the root.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::Leaf(LeafNode::new(self.order)));
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
