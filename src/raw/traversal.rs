use core::borrow::Borrow;
use core::cmp::Ordering;

use smallvec::SmallVec;

use super::handle::Handle;
use super::node::{Node, NodeCapacity, SearchResult};
use super::store::NodeStore;

/// One level of a root-to-leaf path: a node and a position within it.
///
/// For a branch the index is the child slot the path descends through. For the
/// leaf at the bottom it is a cursor in `0..=len` counting the entries already
/// consumed, so a path doubles as an iteration position and two paths over the
/// same tree compare lexicographically by index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Step {
    pub(crate) node: Handle,
    pub(crate) index: usize,
}

/// Root-to-leaf path driving every structural operation.
///
/// Carries the transient state a single put/delete needs between levels: the
/// orphan produced by a split that the parent level must adopt, and the list of
/// nodes emptied by merges, disposed only after the whole operation commits.
#[derive(Clone)]
pub(crate) struct Traversal {
    steps: SmallVec<[Step; 8]>,
    orphan: Option<Handle>,
    done: SmallVec<[Handle; 4]>,
}

/// Immutable snapshot of a path, used as a range-view endpoint. Freezing copies
/// the step values so later tree mutation cannot retroactively move the bound.
#[derive(Clone)]
pub(crate) struct FrozenPath {
    steps: SmallVec<[Step; 8]>,
}

/// How a node relates to its left or right neighbor at the same depth.
///
/// `Same` covers the ordinary case where both share a parent. `Adopted` covers
/// edge children, whose neighbor is a cousin reached through the grandparent's
/// adjacent child (the uncle).
pub(crate) enum SiblingRelation {
    Same {
        level: usize,
        sibling: Handle,
        sibling_index: usize,
    },
    Adopted {
        level: usize,
        sibling: Handle,
        sibling_index: usize,
        uncle: Handle,
        uncle_index: usize,
    },
}

impl SiblingRelation {
    pub(crate) fn sibling(&self) -> Handle {
        match *self {
            Self::Same { sibling, .. } | Self::Adopted { sibling, .. } => sibling,
        }
    }

    /// Repairs separator keys along the sibling's path after its minimum key
    /// changed. The same-family case repairs the parent slot and then climbs
    /// like [`Traversal::reset_ancestor_keys`]; the adopted case must repair
    /// both the uncle's slot and the grandparent's before climbing.
    pub(crate) fn reset_ancestor_keys<K: Ord + Clone, V>(
        &self,
        store: &mut NodeStore<K, V>,
        traversal: &Traversal,
    ) {
        match *self {
            Self::Same { level, sibling_index, .. } => {
                let parent = traversal.steps[level - 1].node;
                store.reset_key(parent, sibling_index);
                if sibling_index == 0 {
                    traversal.reset_ancestor_keys(store, level - 1);
                }
            }
            Self::Adopted { level, sibling_index, uncle, uncle_index, .. } => {
                store.reset_key(uncle, sibling_index);
                let grandparent = traversal.steps[level - 2].node;
                store.reset_key(grandparent, uncle_index);
                if uncle_index == 0 {
                    traversal.reset_ancestor_keys(store, level - 2);
                }
            }
        }
    }
}

impl Traversal {
    fn with_steps(steps: SmallVec<[Step; 8]>) -> Self {
        Self {
            steps,
            orphan: None,
            done: SmallVec::new(),
        }
    }

    /// Descends from the root to the leaf whose range would contain `key`,
    /// recording the navigated child index at each branch. The leaf step's
    /// cursor is the found index or the insertion point; the raw search result
    /// is returned alongside so callers can tell the two apart.
    pub(crate) fn descend<K, V, Q>(store: &NodeStore<K, V>, key: &Q) -> (Self, SearchResult)
    where
        K: Borrow<Q> + Ord + Clone,
        Q: ?Sized + Ord,
    {
        let mut steps: SmallVec<[Step; 8]> = SmallVec::new();
        let mut handle = store.root();
        loop {
            match store.node(handle) {
                Node::Branch(branch) => {
                    let index = branch.navigate_index(key);
                    steps.push(Step { node: handle, index });
                    handle = branch.child(index);
                }
                Node::Leaf(leaf) => {
                    let result = leaf.search(key);
                    steps.push(Step { node: handle, index: result.index() });
                    return (Self::with_steps(steps), result);
                }
            }
        }
    }

    /// Path to the leftmost leaf with its cursor before the first entry.
    pub(crate) fn leftmost<K: Ord + Clone, V>(store: &NodeStore<K, V>) -> Self {
        let mut steps: SmallVec<[Step; 8]> = SmallVec::new();
        let mut handle = store.root();
        loop {
            match store.node(handle) {
                Node::Branch(branch) => {
                    steps.push(Step { node: handle, index: 0 });
                    handle = branch.child(0);
                }
                Node::Leaf(_) => {
                    steps.push(Step { node: handle, index: 0 });
                    return Self::with_steps(steps);
                }
            }
        }
    }

    /// Path to the rightmost leaf with its cursor past the last entry.
    pub(crate) fn rightmost<K: Ord + Clone, V>(store: &NodeStore<K, V>) -> Self {
        let mut steps: SmallVec<[Step; 8]> = SmallVec::new();
        let mut handle = store.root();
        loop {
            match store.node(handle) {
                Node::Branch(branch) => {
                    let index = branch.last_index();
                    steps.push(Step { node: handle, index });
                    handle = branch.child(index);
                }
                Node::Leaf(leaf) => {
                    steps.push(Step { node: handle, index: leaf.len() });
                    return Self::with_steps(steps);
                }
            }
        }
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub(crate) fn step(&self, level: usize) -> Step {
        self.steps[level]
    }

    #[inline]
    pub(crate) fn current(&self) -> Step {
        self.steps[self.depth() - 1]
    }

    #[inline]
    pub(crate) fn current_mut(&mut self) -> &mut Step {
        let level = self.depth() - 1;
        &mut self.steps[level]
    }

    /// Discards the deepest step, moving attention to the parent level.
    pub(crate) fn pop(&mut self) {
        self.steps.pop();
    }

    pub(crate) fn has_orphan(&self) -> bool {
        self.orphan.is_some()
    }

    /// Parks a freshly split node for the next level up to link in.
    pub(crate) fn disown(&mut self, node: Handle) {
        self.orphan = Some(node);
    }

    pub(crate) fn adopt_orphan(&mut self) -> Option<Handle> {
        self.orphan.take()
    }

    /// Marks a node emptied by a merge for disposal once the operation commits.
    pub(crate) fn add_done(&mut self, node: Handle) {
        self.done.push(node);
    }

    /// Disposes everything marked done. Deferred so that a node still consulted
    /// by an in-flight rebalancing decision at an ancestor level is never freed
    /// out from under it.
    pub(crate) fn flush_done<K: Ord + Clone, V>(&mut self, store: &mut NodeStore<K, V>) {
        for handle in self.done.drain(..) {
            store.free(handle);
        }
    }

    /// Repairs ancestor separators after the minimum key of the node at
    /// `level` changed. The parent slot is always repaired; the climb continues
    /// only while each step sits at index 0, because a minimum-key change is
    /// visible to an ancestor only through an unbroken chain of leftmost
    /// positions.
    pub(crate) fn reset_ancestor_keys<K: Ord + Clone, V>(
        &self,
        store: &mut NodeStore<K, V>,
        level: usize,
    ) {
        if level == 0 {
            return;
        }

        let mut at = level - 1;
        loop {
            let step = self.steps[at];
            store.reset_key(step.node, step.index);
            if step.index != 0 || at == 0 {
                return;
            }
            at -= 1;
        }
    }

    /// Left neighbor of the node at `level`, if any.
    pub(crate) fn left_sibling<K: Ord + Clone, V>(
        &self,
        store: &NodeStore<K, V>,
        level: usize,
    ) -> Option<SiblingRelation> {
        if level == 0 {
            return None;
        }

        let parent = self.steps[level - 1];
        if parent.index > 0 {
            let sibling_index = parent.index - 1;
            return Some(SiblingRelation::Same {
                level,
                sibling: store.branch(parent.node).child(sibling_index),
                sibling_index,
            });
        }

        if level < 2 {
            return None;
        }

        let grandparent = self.steps[level - 2];
        if grandparent.index == 0 {
            return None;
        }

        let uncle_index = grandparent.index - 1;
        let uncle = store.branch(grandparent.node).child(uncle_index);
        let sibling_index = store.branch(uncle).last_index();
        Some(SiblingRelation::Adopted {
            level,
            sibling: store.branch(uncle).child(sibling_index),
            sibling_index,
            uncle,
            uncle_index,
        })
    }

    /// Right neighbor of the node at `level`, if any.
    pub(crate) fn right_sibling<K: Ord + Clone, V>(
        &self,
        store: &NodeStore<K, V>,
        level: usize,
    ) -> Option<SiblingRelation> {
        if level == 0 {
            return None;
        }

        let parent = self.steps[level - 1];
        if parent.index + 1 < store.branch(parent.node).len() {
            let sibling_index = parent.index + 1;
            return Some(SiblingRelation::Same {
                level,
                sibling: store.branch(parent.node).child(sibling_index),
                sibling_index,
            });
        }

        if level < 2 {
            return None;
        }

        let grandparent = self.steps[level - 2];
        if grandparent.index + 1 >= store.branch(grandparent.node).len() {
            return None;
        }

        let uncle_index = grandparent.index + 1;
        let uncle = store.branch(grandparent.node).child(uncle_index);
        Some(SiblingRelation::Adopted {
            level,
            sibling: store.branch(uncle).child(0),
            sibling_index: 0,
            uncle,
            uncle_index,
        })
    }

    /// Consumes the next entry in key order, crossing into the next leaf when
    /// the current one is exhausted. Returns the leaf and entry index just
    /// consumed. Amortized O(1), worst case O(height) at a subtree boundary.
    pub(crate) fn advance<K: Ord + Clone, V>(
        &mut self,
        store: &NodeStore<K, V>,
    ) -> Option<(Handle, usize)> {
        let current = self.current();
        if current.index < store.leaf(current.node).len() {
            let step = self.current_mut();
            let consumed = step.index;
            step.index += 1;
            return Some((step.node, consumed));
        }

        // Climb to the nearest ancestor with a further child, then descend its
        // subtree along child 0.
        let mut level = self.depth() - 1;
        loop {
            if level == 0 {
                return None;
            }
            level -= 1;
            let step = self.steps[level];
            if step.index + 1 < store.branch(step.node).len() {
                self.steps.truncate(level + 1);
                self.steps[level].index += 1;
                let mut handle = store.branch(step.node).child(step.index + 1);
                loop {
                    match store.node(handle) {
                        Node::Branch(branch) => {
                            self.steps.push(Step { node: handle, index: 0 });
                            handle = branch.child(0);
                        }
                        Node::Leaf(_) => {
                            self.steps.push(Step { node: handle, index: 1 });
                            return Some((handle, 0));
                        }
                    }
                }
            }
        }
    }

    /// Steps the cursor back over the previous entry in key order, crossing
    /// into the previous leaf at a subtree boundary. Returns the leaf and the
    /// index of the entry stepped over.
    pub(crate) fn retreat<K: Ord + Clone, V>(
        &mut self,
        store: &NodeStore<K, V>,
    ) -> Option<(Handle, usize)> {
        let current = self.current();
        if current.index > 0 {
            let step = self.current_mut();
            step.index -= 1;
            return Some((step.node, step.index));
        }

        let mut level = self.depth() - 1;
        loop {
            if level == 0 {
                return None;
            }
            level -= 1;
            let step = self.steps[level];
            if step.index > 0 {
                self.steps.truncate(level + 1);
                self.steps[level].index -= 1;
                let mut handle = store.branch(step.node).child(step.index - 1);
                loop {
                    match store.node(handle) {
                        Node::Branch(branch) => {
                            let last = branch.last_index();
                            self.steps.push(Step { node: handle, index: last });
                            handle = branch.child(last);
                        }
                        Node::Leaf(leaf) => {
                            let last = leaf.last_index();
                            self.steps.push(Step { node: handle, index: last });
                            return Some((handle, last));
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn freeze(&self) -> FrozenPath {
        FrozenPath { steps: self.steps.clone() }
    }

    /// Lexicographic comparison of this path's position against a frozen bound.
    pub(crate) fn cmp_frozen(&self, bound: &FrozenPath) -> Ordering {
        FrozenPath::cmp_steps(&self.steps, &bound.steps)
    }
}

impl FrozenPath {
    /// Lexicographic comparison of two paths, level by level. Both must have
    /// been captured against the same root at the same height; anything else is
    /// a stale bound, which is a usage defect.
    fn cmp_steps(lhs: &[Step], rhs: &[Step]) -> Ordering {
        assert_eq!(lhs.len(), rhs.len(), "paths captured at different heights");
        assert_eq!(lhs[0].node, rhs[0].node, "paths captured against different roots");

        for (left, right) in lhs.iter().zip(rhs) {
            match left.index.cmp(&right.index) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }

        Ordering::Equal
    }

    pub(crate) fn cmp(&self, other: &FrozenPath) -> Ordering {
        Self::cmp_steps(&self.steps, &other.steps)
    }

    /// Rebuilds a mutable cursor positioned at this snapshot.
    pub(crate) fn thaw(&self) -> Traversal {
        Traversal::with_steps(self.steps.clone())
    }
}
