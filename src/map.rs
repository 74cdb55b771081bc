//! An ordered map backed by an order-parameterized B+ tree.

mod range;

use core::borrow::Borrow;
use core::fmt;

use crate::error::TreeError;
use crate::raw::{NodeStore, RawBPlusTree, Traversal};

pub use range::{RangeIter, RangeView};

/// A sorted key/value map with all entries stored in fixed-capacity leaves.
///
/// The node capacity (the *order*) is chosen at construction and every node
/// except the root stays at least half full, so lookups, insertions, and
/// deletions are all O(log n) with a guaranteed logarithmic height. Bounded
/// range views over `[from, to)` are available through [`sub`](Self::sub),
/// [`head`](Self::head), and [`tail`](Self::tail).
///
/// Keys must be `Ord + Clone`; separator keys in interior nodes are clones of
/// leaf keys.
///
/// # Example
///
/// ```
/// use bplus_tree::BPlusTreeMap;
///
/// let mut map = BPlusTreeMap::new(4);
/// map.insert(3, "c");
/// map.insert(1, "a");
/// map.insert(2, "b");
///
/// assert_eq!(map.get(&2), Some(&"b"));
/// let keys: Vec<i32> = map.keys().copied().collect();
/// assert_eq!(keys, [1, 2, 3]);
/// ```
pub struct BPlusTreeMap<K, V> {
    raw: RawBPlusTree<K, V>,
}

impl<K: Ord + Clone, V> BPlusTreeMap<K, V> {
    /// Node capacity used by [`Default`] and [`FromIterator`].
    pub const DEFAULT_ORDER: usize = 16;

    /// Creates an empty map whose nodes hold up to `order` entries.
    ///
    /// # Panics
    ///
    /// Panics if `order < 3`. Orders below three cannot maintain the
    /// half-full occupancy floor during rebalancing.
    #[must_use]
    pub fn new(order: usize) -> Self {
        Self { raw: RawBPlusTree::new(order) }
    }

    /// The configured node capacity.
    #[must_use]
    pub fn order(&self) -> usize {
        self.raw.order()
    }

    /// The number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The number of levels from the root to the leaves. An empty map or one
    /// whose entries fit in a single leaf has height 1.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Returns a reference to the value for `key`, if present.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns a mutable reference to the value for `key`, if present.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns the stored key and value for `key`, if present.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key).is_some()
    }

    /// Inserts a key/value pair, returning the previous value if the key was
    /// already present. Overwriting never restructures the tree.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.raw.insert(key, value)
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    /// Drops every entry, keeping the configured order.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// The entry with the smallest key.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyTree`] when the map has no entries.
    pub fn first_key_value(&self) -> Result<(&K, &V), TreeError> {
        self.raw.first().ok_or(TreeError::EmptyTree)
    }

    /// The entry with the largest key.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyTree`] when the map has no entries.
    pub fn last_key_value(&self) -> Result<(&K, &V), TreeError> {
        self.raw.last().ok_or(TreeError::EmptyTree)
    }

    /// The smallest key in the map.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyTree`] when the map has no entries.
    pub fn first_key(&self) -> Result<&K, TreeError> {
        self.first_key_value().map(|(key, _)| key)
    }

    /// The largest key in the map.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyTree`] when the map has no entries.
    pub fn last_key(&self) -> Result<&K, TreeError> {
        self.last_key_value().map(|(key, _)| key)
    }

    /// Iterates over all entries in ascending key order. The iterator is
    /// double-ended; iterating from the back yields the exact reverse
    /// sequence.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            store: self.raw.store(),
            front: Traversal::leftmost(self.raw.store()),
            back: Traversal::rightmost(self.raw.store()),
            remaining: self.raw.len(),
        }
    }

    /// Iterates over all keys in ascending order.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates over all values, ordered by key.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// A mutable view over the entries with keys in `[from, to)`.
    ///
    /// The view borrows the map mutably, so the map cannot change underneath
    /// it; mutations through the view keep its bounds valid.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRange`] when `from > to`.
    ///
    /// # Example
    ///
    /// ```
    /// use bplus_tree::BPlusTreeMap;
    ///
    /// let mut map: BPlusTreeMap<i32, i32> = (1..=20).map(|k| (k, k)).collect();
    /// let view = map.sub(5, 15).unwrap();
    ///
    /// let keys: Vec<i32> = view.keys().copied().collect();
    /// assert_eq!(keys, (5..15).collect::<Vec<_>>());
    /// ```
    pub fn sub(&mut self, from: K, to: K) -> Result<RangeView<'_, K, V>, TreeError> {
        if from > to {
            return Err(TreeError::InvalidRange);
        }
        Ok(RangeView::new(self, Some(from), Some(to)))
    }

    /// A mutable view over the entries with keys below `to`.
    pub fn head(&mut self, to: K) -> RangeView<'_, K, V> {
        RangeView::new(self, None, Some(to))
    }

    /// A mutable view over the entries with keys at or above `from`.
    pub fn tail(&mut self, from: K) -> RangeView<'_, K, V> {
        RangeView::new(self, Some(from), None)
    }

    pub(crate) fn raw(&self) -> &RawBPlusTree<K, V> {
        &self.raw
    }

    pub(crate) fn raw_mut(&mut self) -> &mut RawBPlusTree<K, V> {
        &mut self.raw
    }
}

impl<K: Ord + Clone, V> Default for BPlusTreeMap<K, V> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ORDER)
    }
}

impl<K: Ord + Clone + fmt::Debug, V: fmt::Debug> fmt::Debug for BPlusTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for BPlusTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K: Ord + Clone, V> Extend<(K, V)> for BPlusTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + Clone, V: PartialEq> PartialEq for BPlusTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Ord + Clone, V: Eq> Eq for BPlusTreeMap<K, V> {}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a BPlusTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Double-ended iterator over a map's entries in key order.
pub struct Iter<'a, K, V> {
    store: &'a NodeStore<K, V>,
    front: Traversal,
    back: Traversal,
    remaining: usize,
}

impl<'a, K: Ord + Clone, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let (leaf, index) = self.front.advance(self.store)?;
        Some(self.store.leaf(leaf).entry(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord + Clone, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let (leaf, index) = self.back.retreat(self.store)?;
        Some(self.store.leaf(leaf).entry(index))
    }
}

impl<K: Ord + Clone, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K: Ord + Clone, V> core::iter::FusedIterator for Iter<'_, K, V> {}

/// Iterator over a map's keys in ascending order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: Ord + Clone, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord + Clone, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K: Ord + Clone, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over a map's values, ordered by key.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K: Ord + Clone, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K: Ord + Clone, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K: Ord + Clone, V> ExactSizeIterator for Values<'_, K, V> {}
