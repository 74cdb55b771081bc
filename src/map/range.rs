use core::borrow::Borrow;
use core::cmp::Ordering;

use crate::error::TreeError;
use crate::raw::{FrozenPath, NodeStore, Traversal};

use super::BPlusTreeMap;

/// A mutable view over the entries of a [`BPlusTreeMap`] with keys in
/// `[from, to)`.
///
/// The view is delimited by two frozen paths: the lower bound sits just before
/// the first included entry and the upper bound at the consumption point of the
/// last one, so membership and iteration reduce to lexicographic path
/// comparison. The view holds the map's mutable borrow for its whole lifetime,
/// which rules out the tree changing shape underneath the captured bounds;
/// mutations made *through* the view refreeze both bounds afterwards.
///
/// # Example
///
/// ```
/// use bplus_tree::{BPlusTreeMap, TreeError};
///
/// let mut map: BPlusTreeMap<i32, i32> = (1..=20).map(|k| (k, k)).collect();
/// let mut view = map.sub(5, 15).unwrap();
///
/// assert_eq!(view.get(&7), Some(&7));
/// assert_eq!(view.get(&17), None); // present in the map, outside the view
/// assert_eq!(view.insert(3, 3), Err(TreeError::OutOfBounds));
/// ```
pub struct RangeView<'a, K, V> {
    map: &'a mut BPlusTreeMap<K, V>,
    lower_key: Option<K>,
    upper_key: Option<K>,
    lower: FrozenPath,
    upper: FrozenPath,
}

impl<'a, K: Ord + Clone, V> RangeView<'a, K, V> {
    /// Builds a view from already validated bounds. `None` means unbounded on
    /// that side.
    pub(crate) fn new(
        map: &'a mut BPlusTreeMap<K, V>,
        lower_key: Option<K>,
        upper_key: Option<K>,
    ) -> Self {
        let lower = freeze_lower(map.raw().store(), lower_key.as_ref());
        let upper = freeze_upper(map.raw().store(), upper_key.as_ref());
        Self { map, lower_key, upper_key, lower, upper }
    }

    fn refreeze(&mut self) {
        let store = self.map.raw().store();
        self.lower = freeze_lower(store, self.lower_key.as_ref());
        self.upper = freeze_upper(store, self.upper_key.as_ref());
    }

    fn in_bounds<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.lower_key.as_ref().is_none_or(|lower| key >= lower.borrow())
            && self.upper_key.as_ref().is_none_or(|upper| key < upper.borrow())
    }

    /// Returns the value for `key` if it is present and inside the bounds.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if !self.in_bounds(key) {
            return None;
        }
        self.map.raw().get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.get(key).is_some()
    }

    /// Inserts through the view, returning the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::OutOfBounds`] when `key` falls outside the view.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TreeError> {
        if !self.in_bounds(&key) {
            return Err(TreeError::OutOfBounds);
        }
        let previous = self.map.raw_mut().insert(key, value);
        self.refreeze();
        Ok(previous)
    }

    /// Removes a key through the view. Keys outside the bounds are left alone
    /// and reported as absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if !self.in_bounds(key) {
            return None;
        }
        let removed = self.map.raw_mut().remove(key);
        if removed.is_some() {
            self.refreeze();
        }
        removed
    }

    /// True when no entries fall within the bounds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower.cmp(&self.upper) != Ordering::Less
    }

    /// The number of entries within the bounds. Counted by walking the range,
    /// so this is O(k) for k covered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// The smallest entry within the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyTree`] when the view covers nothing.
    pub fn first_key_value(&self) -> Result<(&K, &V), TreeError> {
        self.iter().next().ok_or(TreeError::EmptyTree)
    }

    /// The largest entry within the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyTree`] when the view covers nothing.
    pub fn last_key_value(&self) -> Result<(&K, &V), TreeError> {
        if self.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        let store = self.map.raw().store();
        let mut cursor = self.upper.thaw();
        let (leaf, index) = cursor.retreat(store).ok_or(TreeError::EmptyTree)?;
        Ok(store.leaf(leaf).entry(index))
    }

    /// Iterates over the covered entries in ascending key order.
    #[must_use]
    pub fn iter(&self) -> RangeIter<'_, K, V> {
        RangeIter {
            store: self.map.raw().store(),
            cursor: self.lower.thaw(),
            upper: self.upper.clone(),
        }
    }

    /// Iterates over the covered keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Narrows this view to `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRange`] when `from > to` or when the new
    /// bounds are not contained in the current ones.
    pub fn sub(self, from: K, to: K) -> Result<RangeView<'a, K, V>, TreeError> {
        if from > to || !self.admits_lower(&from) || !self.admits_upper(&to) {
            return Err(TreeError::InvalidRange);
        }
        Ok(RangeView::new(self.map, Some(from), Some(to)))
    }

    /// Narrows this view to the keys below `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRange`] when `to` lies outside the view.
    pub fn head(self, to: K) -> Result<RangeView<'a, K, V>, TreeError> {
        if !self.admits_lower_bound_free(&to) {
            return Err(TreeError::InvalidRange);
        }
        Ok(RangeView::new(self.map, self.lower_key, Some(to)))
    }

    /// Narrows this view to the keys at or above `from`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRange`] when `from` lies outside the view.
    pub fn tail(self, from: K) -> Result<RangeView<'a, K, V>, TreeError> {
        if !self.admits_lower(&from) {
            return Err(TreeError::InvalidRange);
        }
        Ok(RangeView::new(self.map, Some(from), self.upper_key))
    }

    fn admits_lower(&self, key: &K) -> bool {
        self.lower_key.as_ref().is_none_or(|lower| key >= lower)
            && self.upper_key.as_ref().is_none_or(|upper| key <= upper)
    }

    fn admits_upper(&self, key: &K) -> bool {
        self.upper_key.as_ref().is_none_or(|upper| key <= upper)
    }

    fn admits_lower_bound_free(&self, key: &K) -> bool {
        self.lower_key.as_ref().is_none_or(|lower| key >= lower) && self.admits_upper(key)
    }
}

/// The lower endpoint: a path whose cursor sits just before the first entry at
/// or above the bound.
fn freeze_lower<K: Ord + Clone, V>(store: &NodeStore<K, V>, bound: Option<&K>) -> FrozenPath {
    match bound {
        None => Traversal::leftmost(store).freeze(),
        Some(key) => {
            let (traversal, _) = Traversal::descend(store, key);
            traversal.freeze()
        }
    }
}

/// The upper endpoint, normalized to right-edge form: the cursor sits just
/// after the last entry below the bound, expressed within that entry's own
/// leaf. Without the normalization a bound at a leaf's slot 0 and a cursor at
/// the previous leaf's end would disagree lexicographically about the same
/// position.
fn freeze_upper<K: Ord + Clone, V>(store: &NodeStore<K, V>, bound: Option<&K>) -> FrozenPath {
    match bound {
        None => Traversal::rightmost(store).freeze(),
        Some(key) => {
            let (mut traversal, _) = Traversal::descend(store, key);
            if traversal.current().index == 0 && traversal.retreat(store).is_some() {
                traversal.current_mut().index += 1;
            }
            traversal.freeze()
        }
    }
}

/// Iterator over a range view's entries, stopping at the frozen upper bound.
pub struct RangeIter<'a, K, V> {
    store: &'a NodeStore<K, V>,
    cursor: Traversal,
    upper: FrozenPath,
}

impl<'a, K: Ord + Clone, V> Iterator for RangeIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.cmp_frozen(&self.upper) != Ordering::Less {
            return None;
        }
        let (leaf, index) = self.cursor.advance(self.store)?;
        Some(self.store.leaf(leaf).entry(index))
    }
}

impl<K: Ord + Clone, V> core::iter::FusedIterator for RangeIter<'_, K, V> {}
