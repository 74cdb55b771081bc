use core::borrow::Borrow;

use super::handle::Handle;
use super::node::{BranchNode, Node, NodeCapacity, SearchResult};
use super::store::NodeStore;
use super::traversal::Traversal;

/// The tree engine: orchestrates traversals and sibling relations to implement
/// point lookup, insertion, deletion, and ordered stepping over an arena of
/// fixed-order nodes.
///
/// Insertion policy per level is three-tier: place in the target node if it has
/// room, otherwise shed one entry into a sibling with spare capacity, otherwise
/// split and hand the new right half up as an orphan. Deletion mirrors it:
/// borrow from a sibling above its occupancy floor, otherwise merge into a
/// sibling and propagate the removal upward.
pub(crate) struct RawBPlusTree<K, V> {
    store: NodeStore<K, V>,
    len: usize,
}

impl<K: Ord + Clone, V> RawBPlusTree<K, V> {
    pub(crate) fn new(order: usize) -> Self {
        assert!(order >= 3, "order must be at least 3");
        Self {
            store: NodeStore::new(order),
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn store(&self) -> &NodeStore<K, V> {
        &self.store
    }

    #[inline]
    pub(crate) fn order(&self) -> usize {
        self.store.order()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels from root to leaf; a lone leaf root is height 1.
    pub(crate) fn height(&self) -> usize {
        let mut height = 1;
        let mut handle = self.store.root();
        while let Node::Branch(branch) = self.store.node(handle) {
            height += 1;
            handle = branch.child(0);
        }
        height
    }

    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.len = 0;
    }

    fn locate<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut handle = self.store.root();
        loop {
            match self.store.node(handle) {
                Node::Branch(branch) => handle = branch.child(branch.navigate_index(key)),
                Node::Leaf(leaf) => {
                    return match leaf.search(key) {
                        SearchResult::Found(index) => Some((handle, index)),
                        SearchResult::NotFound(_) => None,
                    };
                }
            }
        }
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (handle, index) = self.locate(key)?;
        Some(self.store.leaf(handle).value(index))
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (handle, index) = self.locate(key)?;
        Some(self.store.leaf_mut(handle).value_mut(index))
    }

    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (handle, index) = self.locate(key)?;
        Some(self.store.leaf(handle).entry(index))
    }

    pub(crate) fn first(&self) -> Option<(&K, &V)> {
        if self.len == 0 {
            return None;
        }
        let mut handle = self.store.root();
        loop {
            match self.store.node(handle) {
                Node::Branch(branch) => handle = branch.child(0),
                Node::Leaf(leaf) => return Some(leaf.entry(0)),
            }
        }
    }

    pub(crate) fn last(&self) -> Option<(&K, &V)> {
        if self.len == 0 {
            return None;
        }
        let mut handle = self.store.root();
        loop {
            match self.store.node(handle) {
                Node::Branch(branch) => handle = branch.child(branch.last_index()),
                Node::Leaf(leaf) => return Some(leaf.entry(leaf.last_index())),
            }
        }
    }

    /// Inserts a pair, replacing in place when the key already exists so no
    /// structural work happens on overwrite. Returns the previous value.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (mut traversal, result) = Traversal::descend(&self.store, &key);
        let leaf = traversal.current().node;

        if let SearchResult::Found(index) = result {
            return Some(self.store.leaf_mut(leaf).replace_value(index, value));
        }

        self.len += 1;
        self.put_leaf(&mut traversal, key, value, result.index());
        traversal.pop();

        while let Some(orphan) = traversal.adopt_orphan() {
            if traversal.depth() == 0 {
                self.grow_root(orphan);
                break;
            }
            self.put_branch(&mut traversal, orphan);
            traversal.pop();
        }

        None
    }

    /// Links the orphan beside the old root under a new two-child root.
    fn grow_root(&mut self, orphan: Handle) {
        let old_root = self.store.root();
        let mut root = BranchNode::new(self.store.order());
        root.push(self.store.min_key(old_root).clone(), old_root);
        root.push(self.store.min_key(orphan).clone(), orphan);
        let root = self.store.alloc(Node::Branch(root));
        self.store.set_root(root);
    }

    fn put_leaf(&mut self, traversal: &mut Traversal, key: K, value: V, insert_index: usize) {
        let level = traversal.depth() - 1;
        let handle = traversal.current().node;

        // Tier one: room in the target leaf.
        if !self.store.leaf(handle).is_full() {
            if self.store.leaf_mut(handle).insert(key, value) == 0 {
                traversal.reset_ancestor_keys(&mut self.store, level);
            }
            return;
        }

        // Tier two: shed this leaf's minimum into a left sibling with room.
        if let Some(relation) = traversal.left_sibling(&self.store, level) {
            if !self.store.leaf(relation.sibling()).is_full() {
                let (first_key, first_value) = self.store.leaf_mut(handle).remove(0);
                self.store.leaf_mut(relation.sibling()).push(first_key, first_value);
                self.store.leaf_mut(handle).insert(key, value);
                traversal.reset_ancestor_keys(&mut self.store, level);
                return;
            }
        }

        // Tier two, right side: either the new pair sorts past this whole leaf
        // and goes to the sibling directly, or the leaf's maximum moves over to
        // make room.
        if let Some(relation) = traversal.right_sibling(&self.store, level) {
            if !self.store.leaf(relation.sibling()).is_full() {
                if insert_index == self.store.leaf(handle).len() {
                    self.store.leaf_mut(relation.sibling()).push_front(key, value);
                } else {
                    let last = self.store.leaf(handle).last_index();
                    let (last_key, last_value) = self.store.leaf_mut(handle).remove(last);
                    self.store.leaf_mut(relation.sibling()).push_front(last_key, last_value);
                    if self.store.leaf_mut(handle).insert(key, value) == 0 {
                        traversal.reset_ancestor_keys(&mut self.store, level);
                    }
                }
                relation.reset_ancestor_keys(&mut self.store, traversal);
                return;
            }
        }

        // Tier three: split, parking the right half for the parent level.
        let right = self.store.leaf_mut(handle).split(key, value);
        let right = self.store.alloc(Node::Leaf(right));
        traversal.disown(right);
        traversal.reset_ancestor_keys(&mut self.store, level);
    }

    fn put_branch(&mut self, traversal: &mut Traversal, orphan: Handle) {
        let level = traversal.depth() - 1;
        let handle = traversal.current().node;
        let key = self.store.min_key(orphan).clone();

        if !self.store.branch(handle).is_full() {
            if self.store.branch_mut(handle).insert(key, orphan) == 0 {
                traversal.reset_ancestor_keys(&mut self.store, level);
            }
            return;
        }

        if let Some(relation) = traversal.left_sibling(&self.store, level) {
            if !self.store.branch(relation.sibling()).is_full() {
                let (first_key, first_child) = self.store.branch_mut(handle).remove(0);
                self.store.branch_mut(relation.sibling()).push(first_key, first_child);
                self.store.branch_mut(handle).insert(key, orphan);
                traversal.reset_ancestor_keys(&mut self.store, level);
                return;
            }
        }

        if let Some(relation) = traversal.right_sibling(&self.store, level) {
            if !self.store.branch(relation.sibling()).is_full() {
                let insert_index = match self.store.branch(handle).search(&key) {
                    SearchResult::NotFound(index) => index,
                    SearchResult::Found(_) => panic!("duplicate separator key"),
                };
                if insert_index == self.store.branch(handle).len() {
                    self.store.branch_mut(relation.sibling()).push_front(key, orphan);
                } else {
                    let last = self.store.branch(handle).last_index();
                    let (last_key, last_child) = self.store.branch_mut(handle).remove(last);
                    self.store.branch_mut(relation.sibling()).push_front(last_key, last_child);
                    if self.store.branch_mut(handle).insert(key, orphan) == 0 {
                        traversal.reset_ancestor_keys(&mut self.store, level);
                    }
                }
                relation.reset_ancestor_keys(&mut self.store, traversal);
                return;
            }
        }

        let right = self.store.branch_mut(handle).split(key, orphan);
        let right = self.store.alloc(Node::Branch(right));
        traversal.disown(right);
        traversal.reset_ancestor_keys(&mut self.store, level);
    }

    /// Removes a key, rebalancing bottom-up. Absent keys are a no-op.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (mut traversal, result) = Traversal::descend(&self.store, key);
        let SearchResult::Found(index) = result else {
            return None;
        };

        let value = self.remove_leaf(&mut traversal, index);
        traversal.pop();

        // Walk up repairing any branch the removal pushed below its floor. The
        // root is exempt; it shrinks by collapsing instead.
        while traversal.depth() > 1 {
            let handle = traversal.current().node;
            if !self.store.branch(handle).is_below_min() {
                break;
            }
            self.remove_branch(&mut traversal);
            traversal.pop();
        }

        let root = self.store.root();
        if let Node::Branch(branch) = self.store.node(root) {
            if branch.len() == 1 {
                let child = branch.child(0);
                traversal.add_done(root);
                self.store.set_root(child);
            }
        }

        traversal.flush_done(&mut self.store);
        self.len -= 1;
        Some(value)
    }

    fn remove_leaf(&mut self, traversal: &mut Traversal, index: usize) -> V {
        let level = traversal.depth() - 1;
        let handle = traversal.current().node;

        let (_, value) = self.store.leaf_mut(handle).remove(index);
        if index == 0 {
            traversal.reset_ancestor_keys(&mut self.store, level);
        }

        if !self.store.leaf(handle).is_below_min() {
            return value;
        }

        if let Some(relation) = traversal.left_sibling(&self.store, level) {
            if self.store.leaf(relation.sibling()).is_above_min() {
                let last = self.store.leaf(relation.sibling()).last_index();
                let (borrowed_key, borrowed_value) =
                    self.store.leaf_mut(relation.sibling()).remove(last);
                self.store.leaf_mut(handle).push_front(borrowed_key, borrowed_value);
                traversal.reset_ancestor_keys(&mut self.store, level);
            } else {
                let (keys, values) = self.store.leaf_mut(handle).take_entries();
                self.store.leaf_mut(relation.sibling()).append(keys, values);
                self.remove_from_parent(traversal, level);
                traversal.add_done(handle);
            }
            return value;
        }

        if let Some(relation) = traversal.right_sibling(&self.store, level) {
            if self.store.leaf(relation.sibling()).is_above_min() {
                let (borrowed_key, borrowed_value) =
                    self.store.leaf_mut(relation.sibling()).remove(0);
                self.store.leaf_mut(handle).push(borrowed_key, borrowed_value);
                relation.reset_ancestor_keys(&mut self.store, traversal);
            } else {
                let (keys, values) = self.store.leaf_mut(handle).take_entries();
                self.store.leaf_mut(relation.sibling()).prepend(keys, values);
                relation.reset_ancestor_keys(&mut self.store, traversal);
                self.remove_from_parent(traversal, level);
                traversal.add_done(handle);
            }
        }

        value
    }

    fn remove_branch(&mut self, traversal: &mut Traversal) {
        let level = traversal.depth() - 1;
        let handle = traversal.current().node;

        if let Some(relation) = traversal.left_sibling(&self.store, level) {
            if self.store.branch(relation.sibling()).is_above_min() {
                let last = self.store.branch(relation.sibling()).last_index();
                let (borrowed_key, borrowed_child) =
                    self.store.branch_mut(relation.sibling()).remove(last);
                self.store.branch_mut(handle).push_front(borrowed_key, borrowed_child);
                traversal.reset_ancestor_keys(&mut self.store, level);
            } else {
                let (keys, children) = self.store.branch_mut(handle).take_entries();
                self.store.branch_mut(relation.sibling()).append(keys, children);
                self.remove_from_parent(traversal, level);
                traversal.add_done(handle);
            }
            return;
        }

        if let Some(relation) = traversal.right_sibling(&self.store, level) {
            if self.store.branch(relation.sibling()).is_above_min() {
                let (borrowed_key, borrowed_child) =
                    self.store.branch_mut(relation.sibling()).remove(0);
                self.store.branch_mut(handle).push(borrowed_key, borrowed_child);
                relation.reset_ancestor_keys(&mut self.store, traversal);
            } else {
                let (keys, children) = self.store.branch_mut(handle).take_entries();
                self.store.branch_mut(relation.sibling()).prepend(keys, children);
                relation.reset_ancestor_keys(&mut self.store, traversal);
                self.remove_from_parent(traversal, level);
                traversal.add_done(handle);
            }
        }
    }

    /// Unlinks the node at `level` from its parent after a merge emptied it.
    fn remove_from_parent(&mut self, traversal: &Traversal, level: usize) {
        let parent = traversal.step(level - 1);
        self.store.branch_mut(parent.node).remove(parent.index);
        if parent.index == 0 {
            traversal.reset_ancestor_keys(&mut self.store, level);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
impl<K: Ord + Clone + core::fmt::Debug, V> RawBPlusTree<K, V> {
    /// Walks the whole tree asserting the structural invariants: occupancy
    /// bounds, separator keys equal to subtree minima, strictly increasing
    /// keys, uniform leaf depth, and an accurate entry count.
    pub(crate) fn check_invariants(&self) {
        let mut leaf_depth = None;
        let counted = self.check_node(self.store.root(), 1, true, &mut leaf_depth);
        assert_eq!(counted, self.len, "entry count drifted from len");
    }

    fn check_node(
        &self,
        handle: Handle,
        depth: usize,
        is_root: bool,
        leaf_depth: &mut Option<usize>,
    ) -> usize {
        match self.store.node(handle) {
            Node::Leaf(leaf) => {
                assert!(leaf.len() <= leaf.order(), "leaf over capacity");
                if !is_root {
                    assert!(!leaf.is_below_min(), "non-root leaf below min limit");
                }
                for pair in leaf.keys().windows(2) {
                    assert!(pair[0] < pair[1], "leaf keys out of order");
                }
                match leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) => assert_eq!(*expected, depth, "ragged leaf depth"),
                }
                leaf.len()
            }
            Node::Branch(branch) => {
                assert!(branch.len() <= branch.order(), "branch over capacity");
                if is_root {
                    assert!(branch.len() >= 2, "branch root with fewer than two children");
                } else {
                    assert!(!branch.is_below_min(), "non-root branch below min limit");
                }
                for pair in branch.keys().windows(2) {
                    assert!(pair[0] < pair[1], "branch keys out of order");
                }

                let mut counted = 0;
                for (index, &child) in branch.children().iter().enumerate() {
                    assert_eq!(
                        branch.key(index),
                        self.store.min_key(child),
                        "separator key does not match child minimum"
                    );
                    counted += self.check_node(child, depth + 1, false, leaf_depth);
                }
                counted
            }
        }
    }
}
