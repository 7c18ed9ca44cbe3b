//! An ordered set implemented with an AVL tree.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::ptr;

use crate::tree::{Link, Tree};

#[cfg(any(test, feature = "consistency_check"))]
use crate::error::ConsistencyError;

/// An ordered set implemented with an AVL tree.
///
/// ```
/// use avlset::AvlSet;
/// let mut set = AvlSet::new();
/// set.insert(5);
/// set.insert(3);
/// set.insert(8);
/// assert_eq!(set.get(&3), Some(&3));
/// set.remove(&3);
/// assert!(set.get(&3).is_none());
/// assert_eq!(set.lower_bound(&6).get(), Some(&8));
/// ```
pub struct AvlSet<T> {
    tree: Tree<T>,
}

/// A read-only position inside an [`AvlSet`].
///
/// A cursor either points at an element or at the end of the set, the
/// position one past the largest element. Neighbours are computed on each
/// step by following child and parent links.
pub struct Cursor<'a, T> {
    set: &'a AvlSet<T>,
    node: Link,
}

/// A cursor position detached from the borrow of its set.
///
/// Obtained from [`Cursor::position`] and turned back into a cursor with
/// [`AvlSet::cursor_at`]. A position survives insertions and removals of
/// other elements, including the rotations they cause, and afterwards still
/// reports the correct neighbours. It is invalidated only when its own
/// element is removed or the set is cleared. The end position never expires.
///
/// Positions are only meaningful for the set that produced them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    slot: Option<(usize, u32)>,
}

/// An iterator over the values of a set.
pub struct Iter<'a, T> {
    tree: &'a Tree<T>,
    front: Link,
    back: Link,
    remaining: usize,
}

/// An owning iterator over the values of a set.
pub struct IntoIter<T> {
    tree: Tree<T>,
}

impl<T> AvlSet<T> {
    /// Creates an empty set.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self { tree: Tree::new() }
    }

    /// Returns true if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Removes all elements.
    /// Every outstanding [`Position`] other than the end position expires.
    ///
    /// Node storage is kept for reuse by later insertions, so that positions
    /// taken before the clear can never match a new element.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Gets an iterator over the values of the set in sorted order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: &self.tree,
            front: self.tree.first(),
            back: self.tree.last(),
            remaining: self.tree.len(),
        }
    }

    /// Returns the smallest value in the set.
    pub fn first(&self) -> Option<&T> {
        self.tree.first().map(|index| self.tree.key(index))
    }

    /// Returns the largest value in the set.
    pub fn last(&self) -> Option<&T> {
        self.tree.last().map(|index| self.tree.key(index))
    }

    /// Removes and returns the smallest value in the set.
    pub fn pop_first(&mut self) -> Option<T> {
        self.tree.pop_first()
    }

    /// Removes and returns the largest value in the set.
    pub fn pop_last(&mut self) -> Option<T> {
        self.tree.pop_last()
    }

    /// Returns a cursor at the smallest value, or at the end if the set is empty.
    pub fn begin(&self) -> Cursor<'_, T> {
        Cursor {
            set: self,
            node: self.tree.first(),
        }
    }

    /// Returns a cursor at the end of the set.
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor {
            set: self,
            node: None,
        }
    }

    /// Re-attaches a position obtained from [`Cursor::position`].
    /// Returns `None` if the element it pointed at has since been removed.
    pub fn cursor_at(&self, position: Position) -> Option<Cursor<'_, T>> {
        match position.slot {
            None => Some(self.end()),
            Some((index, generation)) if self.tree.is_live(index, generation) => Some(Cursor {
                set: self,
                node: Some(index),
            }),
            Some(_) => None,
        }
    }
}

impl<T: Ord> AvlSet<T> {
    /// Inserts a value into the set.
    ///
    /// Returns whether the value was newly inserted. If an equal value is
    /// already present the set is left untouched and `value` is dropped.
    pub fn insert(&mut self, value: T) -> bool {
        self.tree.insert(value)
    }

    /// Removes a value from the set.
    /// Returns whether the value was previously in the set.
    ///
    /// The value may be any borrowed form of the set's value type, but the ordering
    /// on the borrowed form *must* match the ordering on the value type.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(value).is_some()
    }

    /// Removes a value from the set.
    /// Returns the value if it was previously in the set.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.remove(value)
    }

    /// Returns a reference to the value in the set that is equal to the given value.
    ///
    /// The value may be any borrowed form of the set's value type, but the ordering
    /// on the borrowed form *must* match the ordering on the value type.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(value).map(|index| self.tree.key(index))
    }

    /// Returns true if the set contains a value.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(value).is_some()
    }

    /// Returns a cursor at the value equal to the given value, or at the end
    /// if there is none.
    pub fn find<Q>(&self, value: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor {
            set: self,
            node: self.tree.find(value),
        }
    }

    /// Returns a cursor at the smallest value not less than the given value,
    /// or at the end if every value is less.
    ///
    /// ```
    /// use avlset::AvlSet;
    /// let set = AvlSet::from([10, 20, 30]);
    /// assert_eq!(set.lower_bound(&20).get(), Some(&20));
    /// assert_eq!(set.lower_bound(&21).get(), Some(&30));
    /// assert!(set.lower_bound(&31).is_end());
    /// ```
    pub fn lower_bound<Q>(&self, value: &Q) -> Cursor<'_, T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Cursor {
            set: self,
            node: self.tree.lower_bound(value),
        }
    }

    /// Checks every structural invariant of the underlying tree.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        self.tree.validate()
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        if let Err(err) = self.validate() {
            panic!("inconsistent tree: {}", err);
        }
    }

    #[cfg(test)]
    pub(crate) fn height(&self) -> usize {
        self.tree.height()
    }
}

impl<'a, T> Cursor<'a, T> {
    /// Returns the value under the cursor, or `None` at the end.
    pub fn get(&self) -> Option<&'a T> {
        self.node.map(|index| self.set.tree.key(index))
    }

    /// Returns true if the cursor is at the end of the set.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Moves to the next value, or to the end after the largest value.
    /// Returns false, without moving, if the cursor already is at the end.
    pub fn move_next(&mut self) -> bool {
        match self.node {
            None => false,
            Some(index) => {
                self.node = self.set.tree.next_node(index);
                true
            }
        }
    }

    /// Moves to the previous value; from the end this is the largest value.
    /// Returns false, without moving, if there is no previous value.
    pub fn move_prev(&mut self) -> bool {
        let prev = match self.node {
            None => self.set.tree.last(),
            Some(index) => self.set.tree.prev_node(index),
        };
        if prev.is_some() {
            self.node = prev;
        }
        prev.is_some()
    }

    /// Returns the value after the cursor without moving it.
    pub fn peek_next(&self) -> Option<&'a T> {
        let tree = &self.set.tree;
        self.node
            .and_then(|index| tree.next_node(index))
            .map(|index| tree.key(index))
    }

    /// Returns the value before the cursor without moving it.
    pub fn peek_prev(&self) -> Option<&'a T> {
        let tree = &self.set.tree;
        match self.node {
            None => tree.last(),
            Some(index) => tree.prev_node(index),
        }
        .map(|index| tree.key(index))
    }

    /// Detaches the cursor's position from the borrow of the set.
    pub fn position(&self) -> Position {
        Position {
            slot: self
                .node
                .map(|index| (index, self.set.tree.generation(index))),
        }
    }
}

impl Position {
    /// The end position of any set.
    pub fn end() -> Self {
        Self { slot: None }
    }

    /// Returns true if this is the end position.
    pub fn is_end(&self) -> bool {
        self.slot.is_none()
    }
}

// Auto derived clone seems to have an invalid type bound of T: Clone
impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.set, other.set) && self.node == other.node
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Cursor").field(value).finish(),
            None => f.write_str("Cursor(end)"),
        }
    }
}

impl<T> Default for AvlSet<T> {
    /// Creates an empty set.
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> Clone for AvlSet<T> {
    /// Builds a fresh tree from the values of `self` in sorted order.
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.extend(source.iter().cloned());
    }
}

impl<T: PartialEq> PartialEq for AvlSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for AvlSet<T> {}

impl<T: PartialOrd> PartialOrd for AvlSet<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for AvlSet<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash> Hash for AvlSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for value in self {
            value.hash(state);
        }
    }
}

impl<T: Ord> FromIterator<T> for AvlSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for AvlSet<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for AvlSet<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a AvlSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for AvlSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { tree: self.tree }
    }
}

impl<T: Ord> Extend<T> for AvlSet<T> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        iter.into_iter().for_each(move |value| {
            self.insert(value);
        });
    }
}

impl<'a, T> Extend<&'a T> for AvlSet<T>
where
    T: Ord + Copy,
    T: 'a,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.extend(iter.into_iter().copied());
    }
}

// Auto derived clone seems to have an invalid type bound of T: Clone
impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.front?;
        self.remaining -= 1;
        self.front = self.tree.next_node(index);
        Some(self.tree.key(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.back?;
        self.remaining -= 1;
        self.back = self.tree.prev_node(index);
        Some(self.tree.key(index))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
