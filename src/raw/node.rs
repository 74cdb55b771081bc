use core::borrow::Borrow;

use smallvec::SmallVec;

use super::handle::Handle;

/// Entries stored inline before a node's storage spills to the heap.
pub(crate) const INLINE_ENTRIES: usize = 16;

pub(crate) type Entries<T> = SmallVec<[T; INLINE_ENTRIES]>;

/// Result of a binary search over a node's keys.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SearchResult {
    /// Key was found at the given index.
    Found(usize),
    /// Key was not found; index is where it would be inserted.
    NotFound(usize),
}

impl SearchResult {
    /// The matching index or the insertion point, whichever applies.
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Found(index) | Self::NotFound(index) => index,
        }
    }
}

/// Occupancy contract shared by leaves and branches.
///
/// Implementors supply the key storage and the configured capacity; everything
/// else is derived. A node at `min_limit` is legal, one below it must be
/// rebalanced, and one above it can lend an entry to a sibling.
pub(crate) trait NodeCapacity<K> {
    fn keys(&self) -> &[K];
    fn order(&self) -> usize;

    #[inline]
    fn len(&self) -> usize {
        self.keys().len()
    }

    #[inline]
    fn min_limit(&self) -> usize {
        self.order().div_ceil(2)
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len() == self.order()
    }

    #[inline]
    fn is_below_min(&self) -> bool {
        self.len() < self.min_limit()
    }

    #[inline]
    fn is_above_min(&self) -> bool {
        self.len() > self.min_limit()
    }

    #[inline]
    fn last_index(&self) -> usize {
        self.len() - 1
    }

    #[inline]
    fn search<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.keys().binary_search_by(|k| k.borrow().cmp(key)) {
            Ok(index) => SearchResult::Found(index),
            Err(index) => SearchResult::NotFound(index),
        }
    }
}

#[allow(clippy::large_enum_variant)]
pub(crate) enum Node<K, V> {
    Branch(BranchNode<K>),
    Leaf(LeafNode<K, V>),
}

impl<K: Ord, V> Node<K, V> {
    pub(crate) fn as_leaf(&self) -> &LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> &mut LeafNode<K, V> {
        match self {
            Node::Leaf(leaf) => leaf,
            Node::Branch(_) => panic!("expected leaf node"),
        }
    }

    pub(crate) fn as_branch(&self) -> &BranchNode<K> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    pub(crate) fn as_branch_mut(&mut self) -> &mut BranchNode<K> {
        match self {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => panic!("expected branch node"),
        }
    }

    /// The smallest key in this node. For a branch this equals the minimum of
    /// its whole subtree, since `keys[0]` mirrors child 0's minimum.
    pub(crate) fn min_key(&self) -> &K {
        match self {
            Node::Branch(branch) => branch.key(0),
            Node::Leaf(leaf) => leaf.key(0),
        }
    }
}

/// Terminal node holding key/value pairs in sorted order.
pub(crate) struct LeafNode<K, V> {
    order: usize,
    keys: Entries<K>,
    values: Entries<V>,
}

impl<K, V> NodeCapacity<K> for LeafNode<K, V> {
    #[inline]
    fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    fn order(&self) -> usize {
        self.order
    }
}

impl<K: Ord, V> LeafNode<K, V> {
    pub(crate) fn new(order: usize) -> Self {
        Self {
            order,
            keys: Entries::new(),
            values: Entries::new(),
        }
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> (&K, &V) {
        (&self.keys[index], &self.values[index])
    }

    /// Swaps in a new value for an existing entry, returning the old one.
    pub(crate) fn replace_value(&mut self, index: usize, value: V) -> V {
        core::mem::replace(&mut self.values[index], value)
    }

    /// Inserts a new pair at its sorted position and returns the index.
    /// Callers use index 0 to know an ancestor separator needs repair.
    pub(crate) fn insert(&mut self, key: K, value: V) -> usize {
        assert!(!self.is_full(), "leaf is full");
        let index = match self.search(&key) {
            SearchResult::NotFound(index) => index,
            SearchResult::Found(_) => panic!("duplicate key violation"),
        };
        self.keys.insert(index, key);
        self.values.insert(index, value);
        index
    }

    /// Splits a full leaf around a new pair. The left (self) half keeps
    /// `(len + 1) / 2` entries, the returned right half keeps the rest, and the
    /// new pair lands in whichever half its key sorts into.
    pub(crate) fn split(&mut self, key: K, value: V) -> LeafNode<K, V> {
        assert!(self.is_full(), "leaf is not full");
        let index = match self.search(&key) {
            SearchResult::NotFound(index) => index,
            SearchResult::Found(_) => panic!("duplicate key violation"),
        };

        let total = self.len() + 1;
        let left_len = total / 2;
        let mut right = LeafNode::new(self.order);

        if index < left_len {
            right.keys = self.keys.drain(left_len - 1..).collect();
            right.values = self.values.drain(left_len - 1..).collect();
            self.keys.insert(index, key);
            self.values.insert(index, value);
        } else {
            right.keys = self.keys.drain(left_len..).collect();
            right.values = self.values.drain(left_len..).collect();
            right.keys.insert(index - left_len, key);
            right.values.insert(index - left_len, value);
        }

        right
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, V) {
        (self.keys.remove(index), self.values.remove(index))
    }

    pub(crate) fn push(&mut self, key: K, value: V) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub(crate) fn push_front(&mut self, key: K, value: V) {
        self.keys.insert(0, key);
        self.values.insert(0, value);
    }

    /// Empties the leaf, handing its entries to a merge target.
    pub(crate) fn take_entries(&mut self) -> (Entries<K>, Entries<V>) {
        (core::mem::take(&mut self.keys), core::mem::take(&mut self.values))
    }

    pub(crate) fn append(&mut self, mut keys: Entries<K>, mut values: Entries<V>) {
        self.keys.append(&mut keys);
        self.values.append(&mut values);
    }

    pub(crate) fn prepend(&mut self, keys: Entries<K>, values: Entries<V>) {
        self.keys.insert_many(0, keys);
        self.values.insert_many(0, values);
    }
}

/// Internal node holding routing keys and child handles. `keys[i]` is always
/// the minimum key of the subtree rooted at `children[i]`, and there are
/// exactly as many keys as children.
pub(crate) struct BranchNode<K> {
    order: usize,
    keys: Entries<K>,
    children: Entries<Handle>,
}

impl<K> NodeCapacity<K> for BranchNode<K> {
    #[inline]
    fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    fn order(&self) -> usize {
        self.order
    }
}

impl<K: Ord> BranchNode<K> {
    pub(crate) fn new(order: usize) -> Self {
        Self {
            order,
            keys: Entries::new(),
            children: Entries::new(),
        }
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    #[cfg(test)]
    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    /// Resolves which child to descend into for a search key: an exact
    /// separator match routes to that child, anything else routes to the child
    /// whose range contains the key, clamped to child 0 on the far left.
    pub(crate) fn navigate_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.search(key) {
            SearchResult::Found(index) | SearchResult::NotFound(index @ 0) => index,
            SearchResult::NotFound(index) => index - 1,
        }
    }

    /// Inserts a separator/child pair at its sorted position and returns the index.
    pub(crate) fn insert(&mut self, key: K, child: Handle) -> usize {
        assert!(!self.is_full(), "branch is full");
        let index = match self.search(&key) {
            SearchResult::NotFound(index) => index,
            SearchResult::Found(_) => panic!("duplicate separator key"),
        };
        self.keys.insert(index, key);
        self.children.insert(index, child);
        index
    }

    /// Splits a full branch around a new separator/child pair; same half/half
    /// policy as [`LeafNode::split`], operating on (key, child) pairs.
    pub(crate) fn split(&mut self, key: K, child: Handle) -> BranchNode<K> {
        assert!(self.is_full(), "branch is not full");
        let index = match self.search(&key) {
            SearchResult::NotFound(index) => index,
            SearchResult::Found(_) => panic!("duplicate separator key"),
        };

        let total = self.len() + 1;
        let left_len = total / 2;
        let mut right = BranchNode::new(self.order);

        if index < left_len {
            right.keys = self.keys.drain(left_len - 1..).collect();
            right.children = self.children.drain(left_len - 1..).collect();
            self.keys.insert(index, key);
            self.children.insert(index, child);
        } else {
            right.keys = self.keys.drain(left_len..).collect();
            right.children = self.children.drain(left_len..).collect();
            right.keys.insert(index - left_len, key);
            right.children.insert(index - left_len, child);
        }

        right
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, Handle) {
        (self.keys.remove(index), self.children.remove(index))
    }

    pub(crate) fn push(&mut self, key: K, child: Handle) {
        self.keys.push(key);
        self.children.push(child);
    }

    pub(crate) fn push_front(&mut self, key: K, child: Handle) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    pub(crate) fn take_entries(&mut self) -> (Entries<K>, Entries<Handle>) {
        (core::mem::take(&mut self.keys), core::mem::take(&mut self.children))
    }

    pub(crate) fn append(&mut self, mut keys: Entries<K>, mut children: Entries<Handle>) {
        self.keys.append(&mut keys);
        self.children.append(&mut children);
    }

    pub(crate) fn prepend(&mut self, keys: Entries<K>, children: Entries<Handle>) {
        self.keys.insert_many(0, keys);
        self.children.insert_many(0, children);
    }
}
